//! Building the import graph from a set of seed files.

use crate::error::GraphError;
use crate::graph::{ImportGraph, ImportNode};
use crate::locate::SourcePathLocator;
use crate::resolver::{cmdline_path, SourceUnitNameResolver};
use crate::Overrides;
use keel_source::{preparse, ParseMode, SourceFile};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Walks imports outward from seed files.
pub struct GraphBuilder<'a> {
    resolver: &'a SourceUnitNameResolver,
    locator: SourcePathLocator,
}

#[derive(Default)]
struct Walk {
    bound: BTreeMap<String, PathBuf>,
    queue: VecDeque<(String, PathBuf)>,
}

impl Walk {
    /// Binds `name` to `path`, queueing it the first time. Rebinding to the
    /// same path is a no-op.
    fn bind(&mut self, name: String, path: PathBuf) -> Result<(), GraphError> {
        match self.bound.get(&name) {
            Some(first) if *first == path => Ok(()),
            Some(first) => Err(GraphError::DuplicateSourceUnitName {
                name,
                first: first.clone(),
                second: path,
            }),
            None => {
                self.bound.insert(name.clone(), path.clone());
                self.queue.push_back((name, path));
                Ok(())
            }
        }
    }
}

impl<'a> GraphBuilder<'a> {
    /// Creates a builder that names and locates files with `resolver`.
    pub fn new(resolver: &'a SourceUnitNameResolver) -> Self {
        Self {
            resolver,
            locator: resolver.locator(),
        }
    }

    /// Builds the graph reachable from `seeds`.
    ///
    /// In [`ParseMode::Lenient`] missing seeds, unreadable files, and imports
    /// that cannot be located are skipped (the latter are recorded on the
    /// importing node); in [`ParseMode::Strict`] each is an error. Returns the
    /// graph together with every name binding made during the walk,
    /// including files that were skipped.
    pub fn build(
        &self,
        seeds: &[PathBuf],
        overrides: &Overrides,
        mode: ParseMode,
    ) -> Result<(ImportGraph, BTreeMap<String, PathBuf>), GraphError> {
        let strict = mode == ParseMode::Strict;
        let mut walk = Walk::default();

        for seed in seeds {
            let path = cmdline_path(seed)?;
            if !overrides.contains_key(&path) && !path.is_file() {
                if strict {
                    return Err(GraphError::SeedNotFound { path });
                }
                tracing::warn!(path = %path.display(), "skipping missing file");
                continue;
            }
            let name = match self.resolver.resolve_cmdline_arg(&path) {
                Ok(name) => name,
                Err(e) if !strict => {
                    tracing::warn!("skipping seed: {e}");
                    continue;
                }
                Err(e) => return Err(e),
            };
            walk.bind(name, path)?;
        }

        let mut nodes: Vec<ImportNode> = Vec::new();
        let mut edges: Vec<(String, String)> = Vec::new();

        while let Some((name, path)) = walk.queue.pop_front() {
            let content = match read_source(&path, overrides) {
                Ok(content) => content,
                Err(e) if !strict => {
                    tracing::warn!("skipping {name}: {e}");
                    continue;
                }
                Err(e) => return Err(e),
            };
            let parsed = preparse(content.as_bytes(), mode).map_err(|source| {
                GraphError::PreParse {
                    path: path.clone(),
                    source,
                }
            })?;

            let mut unresolved_imports = BTreeSet::new();
            for literal in &parsed.imports {
                let import_name = self.resolver.resolve_import(&name, literal);
                match self.locator.locate(&import_name, overrides) {
                    Ok(import_path) => {
                        walk.bind(import_name.clone(), import_path)?;
                        edges.push((import_name, name.clone()));
                    }
                    Err(e) if !strict => {
                        tracing::debug!("{name}: {e}");
                        unresolved_imports.insert(import_name);
                    }
                    Err(e) => return Err(e.with_importer(&name)),
                }
            }

            tracing::debug!(
                name = %name,
                imports = parsed.imports.len(),
                versions = %parsed.versions,
                "pre-parsed source unit"
            );
            nodes.push(ImportNode {
                name,
                path: path.clone(),
                content_hash: parsed.content_hash,
                versions: parsed.versions,
                unresolved_imports,
                directives: parsed.directives,
                source: Arc::new(SourceFile::new(path, content)),
            });
        }

        let mut graph = ImportGraph::new();
        for node in nodes {
            graph.add_node(node);
        }
        for (importee, importer) in edges {
            if !graph.add_edge(&importee, &importer) {
                if let Some(node) = graph.get_mut(&importer) {
                    node.unresolved_imports.insert(importee);
                }
            }
        }
        Ok((graph, walk.bound))
    }
}

fn read_source(path: &Path, overrides: &Overrides) -> Result<String, GraphError> {
    if let Some(content) = overrides.get(path) {
        return Ok(content.clone());
    }
    let bytes = std::fs::read(path).map_err(|source| GraphError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|_| GraphError::InvalidUtf8 {
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn project() -> (tempfile::TempDir, SourceUnitNameResolver) {
        let dir = tempfile::tempdir().unwrap();
        let resolver = SourceUnitNameResolver::new(dir.path().to_path_buf(), vec![], None, vec![]);
        (dir, resolver)
    }

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn follows_relative_imports() {
        let (dir, resolver) = project();
        let a = write(dir.path(), "src/A.sol", "import \"./B.sol\";\npragma solidity ^0.8.0;");
        write(dir.path(), "src/B.sol", "pragma solidity >=0.8.2;");
        let (graph, bound) = GraphBuilder::new(&resolver)
            .build(&[a], &Overrides::new(), ParseMode::Lenient)
            .unwrap();
        assert_eq!(graph.names(), vec!["src/A.sol", "src/B.sol"]);
        assert_eq!(graph.importers_of("src/B.sol"), vec!["src/A.sol"]);
        assert_eq!(bound.len(), 2);
    }

    #[test]
    fn unresolved_recorded_in_lenient_mode() {
        let (dir, resolver) = project();
        let a = write(dir.path(), "A.sol", "import \"./Missing.sol\";");
        let (graph, _) = GraphBuilder::new(&resolver)
            .build(&[a], &Overrides::new(), ParseMode::Lenient)
            .unwrap();
        let node = graph.get("A.sol").unwrap();
        assert!(node.unresolved_imports.contains("Missing.sol"));
    }

    #[test]
    fn unresolved_fatal_in_strict_mode() {
        let (dir, resolver) = project();
        let a = write(dir.path(), "A.sol", "import \"./Missing.sol\";");
        let err = GraphBuilder::new(&resolver)
            .build(&[a], &Overrides::new(), ParseMode::Strict)
            .unwrap_err();
        match err {
            GraphError::ImportNotFound { name, importer } => {
                assert_eq!(name, "Missing.sol");
                assert_eq!(importer.as_deref(), Some("A.sol"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_seed_by_mode() {
        let (dir, resolver) = project();
        let missing = dir.path().join("Gone.sol");
        let builder = GraphBuilder::new(&resolver);
        let (graph, _) = builder
            .build(std::slice::from_ref(&missing), &Overrides::new(), ParseMode::Lenient)
            .unwrap();
        assert!(graph.is_empty());
        let err = builder
            .build(&[missing], &Overrides::new(), ParseMode::Strict)
            .unwrap_err();
        assert!(matches!(err, GraphError::SeedNotFound { .. }));
    }

    #[test]
    fn invalid_utf8_skipped_in_lenient_mode() {
        let (dir, resolver) = project();
        let a = write(dir.path(), "A.sol", "import \"./B.sol\";");
        fs::write(dir.path().join("B.sol"), [0xff, 0xfe, 0x00]).unwrap();
        let builder = GraphBuilder::new(&resolver);
        let (graph, bound) = builder
            .build(std::slice::from_ref(&a), &Overrides::new(), ParseMode::Lenient)
            .unwrap();
        assert_eq!(graph.names(), vec!["A.sol"]);
        assert!(graph.get("A.sol").unwrap().unresolved_imports.contains("B.sol"));
        assert!(bound.contains_key("B.sol"));

        let err = builder
            .build(&[a], &Overrides::new(), ParseMode::Strict)
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidUtf8 { .. }));
    }

    #[test]
    fn overrides_win_over_disk() {
        let (dir, resolver) = project();
        let a = write(dir.path(), "A.sol", "pragma solidity ^0.7.0;");
        let mut overrides = Overrides::new();
        overrides.insert(a.clone(), "pragma solidity ^0.8.0;\nimport \"./New.sol\";".into());
        overrides.insert(dir.path().join("New.sol"), "pragma solidity *;".into());
        let (graph, _) = GraphBuilder::new(&resolver)
            .build(&[a], &overrides, ParseMode::Lenient)
            .unwrap();
        assert_eq!(graph.len(), 2);
        let node = graph.get("A.sol").unwrap();
        assert!(node.versions.contains(&"0.8.1".parse().unwrap()));
        assert!(node.source.content.contains("New.sol"));
    }

    #[test]
    fn cycles_terminate() {
        let (dir, resolver) = project();
        let a = write(dir.path(), "A.sol", "import \"./B.sol\";");
        write(dir.path(), "B.sol", "import \"./A.sol\";");
        let (graph, _) = GraphBuilder::new(&resolver)
            .build(&[a], &Overrides::new(), ParseMode::Lenient)
            .unwrap();
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.edges().len(), 2);
        assert!(graph.sinks().is_empty());
    }

    #[test]
    fn same_seed_twice_is_deduplicated() {
        let (dir, resolver) = project();
        let a = write(dir.path(), "A.sol", "");
        let (graph, _) = GraphBuilder::new(&resolver)
            .build(&[a.clone(), dir.path().join("./A.sol"), a], &Overrides::new(), ParseMode::Strict)
            .unwrap();
        assert_eq!(graph.len(), 1);
    }
}
