//! Change detection against the previous build.

use std::collections::BTreeSet;
use std::path::PathBuf;

use keel_graph::{CompilationUnit, ImportGraph, SourcePathLocator};

use crate::info::BuildInfo;

/// How the current graph differs from the previous build.
///
/// Every list holds source unit names, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Units the previous build did not record.
    pub new: Vec<String>,
    /// Units whose content hash or backing file changed.
    pub modified: Vec<String>,
    /// Units the previous build recorded that are gone from the graph.
    pub deleted: Vec<String>,
    /// Units identical to the previous build.
    pub unchanged: Vec<String>,
    /// Files of the deleted units.
    pub deleted_paths: BTreeSet<PathBuf>,
}

impl ChangeSet {
    /// Returns `true` if nothing was added, modified, or deleted.
    pub fn is_empty(&self) -> bool {
        self.new.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }

    /// New and modified units.
    pub fn dirty(&self) -> BTreeSet<String> {
        self.new.iter().chain(&self.modified).cloned().collect()
    }
}

/// Compares `graph` with the previous build. Without one, every unit is new.
pub fn detect_changes(graph: &ImportGraph, previous: Option<&BuildInfo>) -> ChangeSet {
    let mut changes = ChangeSet::default();

    for node in graph.nodes() {
        match previous.and_then(|p| p.source_units.get(&node.name)) {
            Some(info) if info.content_hash == node.content_hash && info.fs_path == node.path => {
                changes.unchanged.push(node.name.clone());
            }
            Some(_) => changes.modified.push(node.name.clone()),
            None => changes.new.push(node.name.clone()),
        }
    }

    if let Some(previous) = previous {
        for (name, info) in &previous.source_units {
            if graph.get(name).is_none() {
                changes.deleted.push(name.clone());
                changes.deleted_paths.insert(info.fs_path.clone());
            }
        }
    }

    changes.new.sort();
    changes.modified.sort();
    changes.deleted.sort();
    changes.unchanged.sort();
    changes
}

/// Splits `units` into those to recompile and those to reuse.
///
/// A unit is recompiled when it has a dirty member, or when one of its
/// unresolved imports names a file in `deleted_paths`.
pub fn select_units(
    units: Vec<CompilationUnit>,
    changes: &ChangeSet,
    deleted_paths: &BTreeSet<PathBuf>,
    locator: &SourcePathLocator,
    graph: &ImportGraph,
) -> (Vec<CompilationUnit>, Vec<CompilationUnit>) {
    let dirty = changes.dirty();
    units.into_iter().partition(|unit| {
        unit.names.iter().any(|name| dirty.contains(name))
            || unit.contains_unresolved(deleted_paths, locator, graph)
    })
}

/// The dirty units plus every unit that transitively imports one of them.
///
/// These are the files whose downstream outputs must be rebuilt, even if
/// they were compiled in a unit that was not selected.
pub fn files_to_rebuild(graph: &ImportGraph, dirty: &BTreeSet<String>) -> BTreeSet<String> {
    graph.reachable_importers(dirty.iter().map(String::as_str))
}
