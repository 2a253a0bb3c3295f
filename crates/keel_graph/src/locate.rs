//! Mapping source unit names back to files.

use crate::error::GraphError;
use crate::Overrides;
use keel_config::normalize_path;
use std::path::{Path, PathBuf};

/// Finds the file a source unit name refers to.
///
/// A name is joined onto every root in turn (project root, include paths,
/// bundled library path). Exactly one root must produce an existing file or
/// an in-memory override.
#[derive(Debug, Clone)]
pub struct SourcePathLocator {
    roots: Vec<PathBuf>,
}

impl SourcePathLocator {
    /// Creates a locator over `roots`, searched in order.
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    /// Returns the search roots.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Locates `name`, consulting `overrides` before the filesystem.
    pub fn locate(&self, name: &str, overrides: &Overrides) -> Result<PathBuf, GraphError> {
        let mut candidates: Vec<PathBuf> = Vec::new();
        for root in &self.roots {
            let candidate = normalize_path(root, Path::new(name));
            if (overrides.contains_key(&candidate) || candidate.is_file())
                && !candidates.contains(&candidate)
            {
                candidates.push(candidate);
            }
        }
        match candidates.len() {
            0 => Err(GraphError::ImportNotFound {
                name: name.to_string(),
                importer: None,
            }),
            1 => Ok(candidates.remove(0)),
            _ => Err(GraphError::AmbiguousImport {
                name: name.to_string(),
                candidates,
            }),
        }
    }

    /// Returns `true` when `name` joined onto some root is exactly `path`.
    ///
    /// Used to decide whether a file appearing or disappearing could change
    /// how an unresolved import resolves.
    pub fn matches(&self, name: &str, path: &Path) -> bool {
        self.roots
            .iter()
            .any(|root| normalize_path(root, Path::new(name)) == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "pragma solidity ^0.8.0;\n").unwrap();
    }

    #[test]
    fn locate_in_project_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("contracts/A.sol");
        write(&file);
        let locator = SourcePathLocator::new(vec![dir.path().to_path_buf()]);
        assert_eq!(locator.locate("contracts/A.sol", &Overrides::new()).unwrap(), file);
    }

    #[test]
    fn locate_in_include_path() {
        let dir = tempfile::tempdir().unwrap();
        let lib = dir.path().join("node_modules");
        let file = lib.join("@oz/Token.sol");
        write(&file);
        let locator = SourcePathLocator::new(vec![dir.path().to_path_buf(), lib]);
        assert_eq!(locator.locate("@oz/Token.sol", &Overrides::new()).unwrap(), file);
    }

    #[test]
    fn missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let locator = SourcePathLocator::new(vec![dir.path().to_path_buf()]);
        let err = locator.locate("Nope.sol", &Overrides::new()).unwrap_err();
        assert!(matches!(err, GraphError::ImportNotFound { ref name, .. } if name == "Nope.sol"));
    }

    #[test]
    fn two_roots_is_ambiguous() {
        let dir = tempfile::tempdir().unwrap();
        let lib = dir.path().join("lib");
        write(&dir.path().join("X.sol"));
        write(&lib.join("X.sol"));
        let locator = SourcePathLocator::new(vec![dir.path().to_path_buf(), lib]);
        match locator.locate("X.sol", &Overrides::new()).unwrap_err() {
            GraphError::AmbiguousImport { candidates, .. } => assert_eq!(candidates.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn same_root_twice_is_not_ambiguous() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("X.sol"));
        let root = dir.path().to_path_buf();
        let locator = SourcePathLocator::new(vec![root.clone(), root]);
        assert!(locator.locate("X.sol", &Overrides::new()).is_ok());
    }

    #[test]
    fn override_counts_as_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Unsaved.sol");
        let mut overrides = Overrides::new();
        overrides.insert(path.clone(), "contract U {}".into());
        let locator = SourcePathLocator::new(vec![dir.path().to_path_buf()]);
        assert_eq!(locator.locate("Unsaved.sol", &overrides).unwrap(), path);
    }

    #[test]
    fn matches_any_root() {
        let locator = SourcePathLocator::new(vec![
            PathBuf::from("/project"),
            PathBuf::from("/project/lib"),
        ]);
        assert!(locator.matches("a/B.sol", Path::new("/project/a/B.sol")));
        assert!(locator.matches("a/B.sol", Path::new("/project/lib/a/B.sol")));
        assert!(!locator.matches("a/B.sol", Path::new("/elsewhere/a/B.sol")));
    }
}
