//! Splitting the import graph into compilation units.
//!
//! A compilation unit is a closed set of source units: every import of a
//! member is itself a member. Units are seeded from the files nothing imports
//! (and from import cycles nothing outside imports), so each unit can be
//! handed to a single compiler invocation.

use crate::graph::ImportGraph;
use crate::locate::SourcePathLocator;
use keel_common::{ContentHash, SemanticVersion, VersionRange, VersionRanges};
use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use petgraph::Direction;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::path::PathBuf;

/// A set of source units compiled together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnit {
    /// Member source unit names.
    pub names: BTreeSet<String>,
    /// Member file paths.
    pub files: BTreeSet<PathBuf>,
    /// Compiler versions every member accepts.
    pub versions: VersionRanges,
    /// Order-independent identity of the members and their contents.
    pub hash: ContentHash,
}

impl CompilationUnit {
    /// Builds a unit from member names, reading paths, pragmas, and hashes
    /// from `graph`. Names missing from the graph are ignored.
    pub fn from_names(graph: &ImportGraph, names: BTreeSet<String>) -> Self {
        let mut files = BTreeSet::new();
        let mut versions = VersionRanges::any();
        let mut hash = ContentHash::ZERO;
        for node in names.iter().filter_map(|n| graph.get(n)) {
            files.insert(node.path.clone());
            versions = versions.intersect(&node.versions);
            hash = hash ^ ContentHash::from_bytes(node.name.as_bytes()) ^ node.content_hash;
        }
        Self {
            names,
            files,
            versions,
            hash,
        }
    }

    /// Number of member source units.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` for a unit without members.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns `true` if a member has an unresolved import that would have
    /// resolved to one of `deleted`.
    pub fn contains_unresolved(
        &self,
        deleted: &BTreeSet<PathBuf>,
        locator: &SourcePathLocator,
        graph: &ImportGraph,
    ) -> bool {
        self.names
            .iter()
            .filter_map(|n| graph.get(n))
            .flat_map(|node| node.unresolved_imports.iter())
            .any(|import| deleted.iter().any(|path| locator.matches(import, path)))
    }

    /// Member paths, comma separated.
    pub fn describe_files(&self) -> String {
        self.files
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Splits `graph` into compilation units.
///
/// Sinks of a shrinking working copy seed units made of everything they
/// transitively import. Once the remaining nodes have no sinks, each closed
/// import cycle (no member imported from outside the cycle) seeds one unit.
/// Seeds whose closure is already covered by an earlier unit are skipped.
pub fn partition(graph: &ImportGraph) -> Vec<CompilationUnit> {
    let original = graph.inner();
    let mut work: StableDiGraph<(), ()> = StableDiGraph::from(original.map(|_, _| (), |_, _| ()));
    let mut covered: HashSet<NodeIndex> = HashSet::new();
    let mut units = Vec::new();
    let name_of = |idx: NodeIndex| original[idx].name.as_str();

    while work.node_count() > 0 {
        let mut sinks: Vec<NodeIndex> = work
            .node_indices()
            .filter(|&n| work.neighbors_directed(n, Direction::Outgoing).next().is_none())
            .collect();
        sinks.sort_by_key(|&n| name_of(n));
        for &sink in &sinks {
            if !covered.contains(&sink) {
                units.push(closure(graph, &[sink], &mut covered));
            }
            work.remove_node(sink);
        }

        let mut cycles: Vec<Vec<NodeIndex>> = tarjan_scc(&work)
            .into_iter()
            .filter(|scc| scc.len() > 1 || work.find_edge(scc[0], scc[0]).is_some())
            .filter(|scc| {
                scc.iter().all(|&n| {
                    work.neighbors_directed(n, Direction::Outgoing)
                        .all(|m| scc.contains(&m))
                })
            })
            .collect();
        for scc in &mut cycles {
            scc.sort_by_key(|&n| name_of(n));
        }
        cycles.sort_by_key(|scc| name_of(scc[0]));
        for scc in cycles {
            if !scc.iter().all(|n| covered.contains(n)) {
                units.push(closure(graph, &scc, &mut covered));
            }
            for n in scc {
                work.remove_node(n);
            }
        }
    }

    tracing::debug!(nodes = graph.len(), units = units.len(), "partitioned import graph");
    units
}

/// Everything transitively imported by `seeds`, seeds included.
fn closure(
    graph: &ImportGraph,
    seeds: &[NodeIndex],
    covered: &mut HashSet<NodeIndex>,
) -> CompilationUnit {
    let inner = graph.inner();
    let mut seen: HashSet<NodeIndex> = seeds.iter().copied().collect();
    let mut queue: VecDeque<NodeIndex> = seeds.iter().copied().collect();
    while let Some(idx) = queue.pop_front() {
        for prev in inner.neighbors_directed(idx, Direction::Incoming) {
            if seen.insert(prev) {
                queue.push_back(prev);
            }
        }
    }
    let names = seen.iter().map(|&n| inner[n].name.clone()).collect();
    covered.extend(seen);
    CompilationUnit::from_names(graph, names)
}

/// Merges compatible units to reduce the number of compiler runs.
///
/// Units with an empty version range are returned unchanged. The rest are
/// sorted by lowest accepted version, then by first upper bound, and merged
/// greedily while their ranges still overlap and both sides agree on whether
/// some usable compiler exists: a version `>= min_version`, or the pinned
/// `target_version` when set.
pub fn merge_units(
    graph: &ImportGraph,
    units: Vec<CompilationUnit>,
    min_version: &SemanticVersion,
    target_version: Option<&SemanticVersion>,
) -> Vec<CompilationUnit> {
    let usable = VersionRanges::from(VersionRange::at_least(min_version.clone()));
    let supportable = |versions: &VersionRanges| match target_version {
        Some(target) => versions.contains(target),
        None => !versions.intersect(&usable).is_empty(),
    };

    let (empty, mut rest): (Vec<_>, Vec<_>) =
        units.into_iter().partition(|u| u.versions.is_empty());
    let max = SemanticVersion::new(u64::MAX, u64::MAX, u64::MAX);
    rest.sort_by_cached_key(|u| {
        (
            u.versions.lowest().cloned().unwrap_or_else(SemanticVersion::zero),
            u.versions.first_upper().cloned().unwrap_or_else(|| max.clone()),
        )
    });

    let mut merged = Vec::new();
    let mut iter = rest.into_iter();
    if let Some(mut current) = iter.next() {
        for next in iter {
            let joint = current.versions.intersect(&next.versions);
            if !joint.is_empty() && supportable(&current.versions) == supportable(&next.versions) {
                let names = current.names.union(&next.names).cloned().collect();
                current = CompilationUnit::from_names(graph, names);
            } else {
                merged.push(current);
                current = next;
            }
        }
        merged.push(current);
    }
    merged.extend(empty);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::graph;

    fn names(unit: &CompilationUnit) -> Vec<&str> {
        unit.names.iter().map(String::as_str).collect()
    }

    #[test]
    fn diamond_is_one_unit() {
        let g = graph(
            &[("A", "*"), ("B", "*"), ("C", "*"), ("D", "*")],
            &[("D", "B"), ("D", "C"), ("B", "A"), ("C", "A")],
        );
        let units = partition(&g);
        assert_eq!(units.len(), 1);
        assert_eq!(names(&units[0]), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn two_sinks_share_a_dependency() {
        let g = graph(
            &[("A", "*"), ("B", "*"), ("Lib", "*")],
            &[("Lib", "A"), ("Lib", "B")],
        );
        let units = partition(&g);
        assert_eq!(units.len(), 2);
        assert_eq!(names(&units[0]), vec!["A", "Lib"]);
        assert_eq!(names(&units[1]), vec!["B", "Lib"]);
    }

    #[test]
    fn isolated_cycle_becomes_unit() {
        let g = graph(
            &[("A", "*"), ("B", "*"), ("C", "*")],
            &[("A", "B"), ("B", "A"), ("C", "A")],
        );
        let units = partition(&g);
        assert_eq!(units.len(), 1);
        assert_eq!(names(&units[0]), vec!["A", "B", "C"]);
    }

    #[test]
    fn cycle_under_a_sink_is_covered() {
        let g = graph(
            &[("A", "*"), ("B", "*"), ("Main", "*")],
            &[("A", "B"), ("B", "A"), ("A", "Main")],
        );
        let units = partition(&g);
        assert_eq!(units.len(), 1);
        assert_eq!(names(&units[0]), vec!["A", "B", "Main"]);
    }

    #[test]
    fn self_import_is_a_cycle() {
        let g = graph(&[("A", "*")], &[("A", "A")]);
        let units = partition(&g);
        assert_eq!(units.len(), 1);
        assert_eq!(names(&units[0]), vec!["A"]);
    }

    #[test]
    fn every_node_is_covered() {
        let g = graph(
            &[("A", "*"), ("B", "*"), ("C", "*"), ("D", "*"), ("E", "*")],
            &[("A", "B"), ("B", "C"), ("C", "A"), ("D", "E"), ("E", "D"), ("C", "D")],
        );
        let units = partition(&g);
        let all: BTreeSet<&str> = units.iter().flat_map(|u| u.names.iter().map(String::as_str)).collect();
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn versions_intersect_members() {
        let g = graph(&[("A", "^0.8.0"), ("B", ">=0.8.10")], &[("B", "A")]);
        let units = partition(&g);
        assert_eq!(units[0].versions.to_string(), ">=0.8.10 <0.9.0");
    }

    #[test]
    fn hash_depends_on_members_not_order() {
        let g = graph(&[("A", "*"), ("B", "*")], &[]);
        let ab = CompilationUnit::from_names(&g, ["A".to_string(), "B".to_string()].into());
        let ba = CompilationUnit::from_names(&g, ["B".to_string(), "A".to_string()].into());
        let a = CompilationUnit::from_names(&g, ["A".to_string()].into());
        assert_eq!(ab.hash, ba.hash);
        assert_ne!(ab.hash, a.hash);
    }

    #[test]
    fn merge_compatible_units() {
        let g = graph(
            &[("A", "^0.8.0"), ("B", ">=0.8.5"), ("C", "^0.7.0")],
            &[],
        );
        let units = partition(&g);
        let merged = merge_units(&g, units, &"0.6.2".parse().unwrap(), None);
        assert_eq!(merged.len(), 2);
        assert_eq!(names(&merged[0]), vec!["C"]);
        assert_eq!(names(&merged[1]), vec!["A", "B"]);
        assert_eq!(merged[1].versions.to_string(), ">=0.8.5 <0.9.0");
    }

    #[test]
    fn merge_keeps_empty_ranges_apart() {
        let g = graph(&[("A", "^0.8.0"), ("Bad", "^0.8.0"), ("Ok", "^0.8.0")], &[]);
        let mut units = partition(&g);
        units[1].versions = VersionRanges::none();
        let merged = merge_units(&g, units, &"0.6.2".parse().unwrap(), None);
        assert_eq!(merged.len(), 2);
        assert_eq!(names(&merged[0]), vec!["A", "Ok"]);
        assert_eq!(names(&merged[1]), vec!["Bad"]);
    }

    #[test]
    fn merge_respects_supportability() {
        let g = graph(&[("Old", ">=0.4.0 <0.6.0"), ("New", ">=0.5.0")], &[]);
        let units = partition(&g);
        // Old has no version >= 0.6.2, New does: keep apart despite overlap.
        let merged = merge_units(&g, units.clone(), &"0.6.2".parse().unwrap(), None);
        assert_eq!(merged.len(), 2);
        // Both contain the pinned target, so they merge.
        let merged = merge_units(&g, units, &"0.6.2".parse().unwrap(), Some(&"0.5.5".parse().unwrap()));
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn merge_with_target() {
        let g = graph(&[("A", "^0.8.0"), ("B", ">=0.8.10 <0.8.20")], &[]);
        let units = partition(&g);
        let merged = merge_units(&g, units, &"0.6.2".parse().unwrap(), Some(&"0.8.15".parse().unwrap()));
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].len(), 2);
    }

    #[test]
    fn unresolved_matches_deleted_path() {
        let mut g = graph(&[("A", "*")], &[]);
        g.get_mut("A").unwrap().unresolved_imports.insert("lib/B.sol".into());
        let units = partition(&g);
        let locator = SourcePathLocator::new(vec![PathBuf::from("/p")]);
        let deleted: BTreeSet<PathBuf> = [PathBuf::from("/p/lib/B.sol")].into();
        assert!(units[0].contains_unresolved(&deleted, &locator, &g));
        let other: BTreeSet<PathBuf> = [PathBuf::from("/p/lib/C.sol")].into();
        assert!(!units[0].contains_unresolved(&other, &locator, &g));
    }

    #[test]
    fn describe_lists_paths() {
        let g = graph(&[("A.sol", "*"), ("B.sol", "*")], &[("A.sol", "B.sol")]);
        let units = partition(&g);
        assert_eq!(units[0].describe_files(), "/p/A.sol, /p/B.sol");
    }
}
