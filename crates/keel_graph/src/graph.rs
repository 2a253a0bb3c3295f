//! The import graph: one node per source unit, edges from importee to importer.

use keel_common::{ContentHash, VersionRanges};
use keel_diagnostics::SourceLookup;
use keel_source::{Directives, SourceFile};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;

/// A source unit in the import graph.
#[derive(Debug, Clone)]
pub struct ImportNode {
    /// The source unit name.
    pub name: String,
    /// The file backing this unit.
    pub path: PathBuf,
    /// Hash of the file's raw bytes.
    pub content_hash: ContentHash,
    /// Compiler versions allowed by the file's pragmas.
    pub versions: VersionRanges,
    /// Imported names that could not be located.
    pub unresolved_imports: BTreeSet<String>,
    /// Suppression directives found in the file's comments.
    pub directives: Directives,
    /// The loaded file text.
    pub source: Arc<SourceFile>,
}

/// Directed graph of source units.
///
/// An edge `a -> b` means `b` imports `a`, so sinks are the files nothing
/// else imports.
#[derive(Debug, Clone, Default)]
pub struct ImportGraph {
    graph: DiGraph<ImportNode, ()>,
    indices: HashMap<String, NodeIndex>,
}

impl ImportGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node, replacing the payload if the name is already present.
    pub fn add_node(&mut self, node: ImportNode) -> NodeIndex {
        if let Some(&idx) = self.indices.get(&node.name) {
            self.graph[idx] = node;
            return idx;
        }
        let name = node.name.clone();
        let idx = self.graph.add_node(node);
        self.indices.insert(name, idx);
        idx
    }

    /// Records that `importer` imports `importee`. Returns `false` if either
    /// name is unknown.
    pub fn add_edge(&mut self, importee: &str, importer: &str) -> bool {
        match (self.index_of(importee), self.index_of(importer)) {
            (Some(from), Some(to)) => {
                self.graph.update_edge(from, to, ());
                true
            }
            _ => false,
        }
    }

    /// Looks up a node by name.
    pub fn get(&self, name: &str) -> Option<&ImportNode> {
        self.index_of(name).map(|idx| &self.graph[idx])
    }

    /// Looks up a node by name for modification.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut ImportNode> {
        let idx = self.index_of(name)?;
        Some(&mut self.graph[idx])
    }

    /// Returns the petgraph index for `name`.
    pub fn index_of(&self, name: &str) -> Option<NodeIndex> {
        self.indices.get(name).copied()
    }

    /// Number of source units.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns `true` when the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// All source unit names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.indices.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Iterates over every node, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &ImportNode> {
        self.graph.node_weights()
    }

    /// Names of the units that import `name`, sorted.
    pub fn importers_of(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Outgoing)
    }

    /// Names of the units `name` imports, sorted.
    pub fn imports_of(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Incoming)
    }

    fn neighbors(&self, name: &str, dir: Direction) -> Vec<&str> {
        let Some(idx) = self.index_of(name) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = self
            .graph
            .neighbors_directed(idx, dir)
            .map(|n| self.graph[n].name.as_str())
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Every unit that transitively imports one of `seeds`, seeds included.
    ///
    /// Unknown seed names are ignored.
    pub fn reachable_importers<'a, I>(&self, seeds: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen: BTreeSet<String> = BTreeSet::new();
        let mut queue: VecDeque<NodeIndex> = VecDeque::new();
        for seed in seeds {
            if let Some(idx) = self.index_of(seed) {
                if seen.insert(seed.to_string()) {
                    queue.push_back(idx);
                }
            }
        }
        while let Some(idx) = queue.pop_front() {
            for next in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                if seen.insert(self.graph[next].name.clone()) {
                    queue.push_back(next);
                }
            }
        }
        seen
    }

    /// Names of the units no other unit imports, sorted.
    pub fn sinks(&self) -> Vec<&str> {
        let mut sinks: Vec<&str> = self
            .graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Outgoing)
                    .next()
                    .is_none()
            })
            .map(|idx| self.graph[idx].name.as_str())
            .collect();
        sinks.sort_unstable();
        sinks
    }

    /// The source unit name to file path map.
    pub fn name_to_path(&self) -> BTreeMap<String, PathBuf> {
        self.graph
            .node_weights()
            .map(|n| (n.name.clone(), n.path.clone()))
            .collect()
    }

    /// All edges as `(importee, importer)` name pairs, sorted.
    pub fn edges(&self) -> Vec<(String, String)> {
        let mut edges: Vec<(String, String)> = self
            .graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(a, b)| (self.graph[a].name.clone(), self.graph[b].name.clone()))
            .collect();
        edges.sort();
        edges
    }

    /// The underlying petgraph graph.
    pub fn inner(&self) -> &DiGraph<ImportNode, ()> {
        &self.graph
    }
}

impl SourceLookup for ImportGraph {
    fn lookup(&self, source_unit: &str) -> Option<&SourceFile> {
        self.get(source_unit).map(|n| n.source.as_ref())
    }
}
