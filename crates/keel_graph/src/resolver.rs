//! Source unit name resolution for imports and command-line paths.

use crate::error::GraphError;
use crate::locate::SourcePathLocator;
use keel_config::{normalize_path, Remapping};
use std::path::{Path, PathBuf};

/// Computes source unit names the way the Solidity compiler does.
///
/// Import literals are first offered to the remappings. Otherwise, literals
/// starting with `./` or `../` are resolved against the importing unit's
/// name, and anything else is used verbatim.
#[derive(Debug, Clone)]
pub struct SourceUnitNameResolver {
    project_root: PathBuf,
    include_paths: Vec<PathBuf>,
    bundled_path: Option<PathBuf>,
    remappings: Vec<Remapping>,
}

impl SourceUnitNameResolver {
    /// Creates a resolver. Paths are expected to be absolute.
    pub fn new(
        project_root: PathBuf,
        include_paths: Vec<PathBuf>,
        bundled_path: Option<PathBuf>,
        remappings: Vec<Remapping>,
    ) -> Self {
        Self {
            project_root,
            include_paths,
            bundled_path,
            remappings,
        }
    }

    /// Returns the project root.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Returns the include paths.
    pub fn include_paths(&self) -> &[PathBuf] {
        &self.include_paths
    }

    /// Returns the bundled library path, if any.
    pub fn bundled_path(&self) -> Option<&Path> {
        self.bundled_path.as_deref()
    }

    /// Returns the remappings in priority order.
    pub fn remappings(&self) -> &[Remapping] {
        &self.remappings
    }

    /// Roots searched for source unit names, in priority order.
    pub fn roots(&self) -> Vec<PathBuf> {
        std::iter::once(self.project_root.clone())
            .chain(self.include_paths.iter().cloned())
            .chain(self.bundled_path.iter().cloned())
            .collect()
    }

    /// Builds the matching locator over the same roots.
    pub fn locator(&self) -> SourcePathLocator {
        SourcePathLocator::new(self.roots())
    }

    /// Applies the best matching remapping to `name`, if any matches.
    ///
    /// Among applicable remappings the longest context wins, then the longest
    /// prefix, then the one listed last. Only the first occurrence of the
    /// prefix is replaced.
    pub fn apply_remapping(&self, importer: &str, name: &str) -> Option<String> {
        let (_, best) = self
            .remappings
            .iter()
            .enumerate()
            .filter(|(_, r)| {
                r.context.as_deref().is_none_or(|c| importer.starts_with(c))
                    && name.starts_with(&r.prefix)
            })
            .max_by_key(|(i, r)| (r.context.as_ref().map_or(0, String::len), r.prefix.len(), *i))?;
        Some(name.replacen(&best.prefix, &best.target, 1))
    }

    /// Resolves the source unit name of `literal` imported from `importer`.
    pub fn resolve_import(&self, importer: &str, literal: &str) -> String {
        if let Some(remapped) = self.apply_remapping(importer, literal) {
            return remapped;
        }
        if is_relative(literal) {
            let resolved = resolve_relative(importer, literal);
            return self
                .apply_remapping(importer, &resolved)
                .unwrap_or(resolved);
        }
        literal.to_string()
    }

    /// Derives the source unit name of a file given on the command line.
    ///
    /// Relative paths are taken from the current directory. The path is
    /// stripped of the first root that contains it (project root, then
    /// include paths, then the bundled library path) and joined with `/`.
    pub fn resolve_cmdline_arg(&self, path: &Path) -> Result<String, GraphError> {
        self.name_under_roots(cmdline_path(path)?)
    }

    /// [`resolve_cmdline_arg`](Self::resolve_cmdline_arg) with relative
    /// paths taken from `cwd`.
    pub fn resolve_cmdline_arg_from(&self, cwd: &Path, path: &Path) -> Result<String, GraphError> {
        self.name_under_roots(normalize_path(cwd, path))
    }

    fn name_under_roots(&self, path: PathBuf) -> Result<String, GraphError> {
        for root in self.roots() {
            if let Ok(rel) = path.strip_prefix(&root) {
                let parts: Vec<String> = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                if !parts.is_empty() {
                    return Ok(parts.join("/"));
                }
            }
        }
        Err(GraphError::OutsideRoots { path })
    }
}

/// Makes a command-line path absolute against the current directory.
pub fn cmdline_path(path: &Path) -> Result<PathBuf, GraphError> {
    if path.is_absolute() {
        return Ok(normalize_path(path, path));
    }
    let cwd = std::env::current_dir().map_err(|source| GraphError::Io {
        path: PathBuf::from("."),
        source,
    })?;
    Ok(normalize_path(&cwd, path))
}

fn is_relative(literal: &str) -> bool {
    literal == "." || literal == ".." || literal.starts_with("./") || literal.starts_with("../")
}

fn strip_trailing_empty(parts: &mut Vec<&str>) {
    while parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }
}

/// Resolves a `./` or `../` import against the importer's name.
///
/// Slash runs in the literal collapse; the importer's own segments are kept
/// as written (so `protocol://` prefixes survive) apart from trailing
/// slashes.
fn resolve_relative(importer: &str, literal: &str) -> String {
    let mut import_parts: Vec<&str> = Vec::new();
    for part in literal.split('/') {
        match part {
            "" | "." => {}
            ".." => match import_parts.last() {
                Some(&last) if last != ".." => {
                    import_parts.pop();
                }
                _ => import_parts.push(".."),
            },
            other => import_parts.push(other),
        }
    }

    let mut parent: Vec<&str> = importer.split('/').collect();
    strip_trailing_empty(&mut parent);
    parent.pop();
    strip_trailing_empty(&mut parent);

    let mut rest = import_parts.as_slice();
    while let Some((&"..", tail)) = rest.split_first() {
        strip_trailing_empty(&mut parent);
        parent.pop();
        rest = tail;
    }

    parent.extend_from_slice(rest);
    parent.join("/")
}
