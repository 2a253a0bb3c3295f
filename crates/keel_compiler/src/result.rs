//! What a build produces.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use keel_common::SemanticVersion;
use keel_diagnostics::Diagnostic;
use keel_driver::SolcOutput;
use keel_graph::{CompilationUnit, ImportGraph};
use serde_json::Value;

use crate::failure::UnitFailure;

/// A unit that was handed to the compiler in this build.
#[derive(Debug, Clone)]
pub struct CompiledUnit {
    /// The compiled unit.
    pub unit: CompilationUnit,
    /// The release it was compiled with.
    pub version: SemanticVersion,
    /// The compiler's output document.
    pub output: SolcOutput,
}

/// The outcome of one build.
#[derive(Debug, Clone, Default)]
pub struct BuildResult {
    /// The import graph the build was planned on.
    pub graph: ImportGraph,
    /// Every current compilation unit, compiled or reused.
    pub units: Vec<CompilationUnit>,
    /// Units compiled in this build, ordered by their first member name.
    pub compiled: Vec<CompiledUnit>,
    /// Units that produced no output.
    pub failures: Vec<UnitFailure>,
    /// Diagnostics per file after suppression, sorted and deduplicated.
    /// Every file in the graph has an entry.
    pub diagnostics: BTreeMap<PathBuf, Vec<Diagnostic>>,
    /// Diagnostics that point at no file.
    pub global_diagnostics: Vec<Diagnostic>,
    /// Files whose downstream outputs changed.
    pub files_to_rebuild: BTreeSet<PathBuf>,
    /// Units carried over unchanged from the previous build.
    pub reused_units: usize,
    /// Syntax trees per source unit name, fresh or carried over.
    pub asts: BTreeMap<String, Value>,
}

impl BuildResult {
    /// Returns `true` if any unit failed or any diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        !self.failures.is_empty()
            || self.global_diagnostics.iter().any(|d| d.severity.is_error())
            || self
                .diagnostics
                .values()
                .flatten()
                .any(|d| d.severity.is_error())
    }

    /// Number of diagnostics of every file plus the global ones.
    pub fn diagnostic_count(&self) -> usize {
        self.global_diagnostics.len() + self.diagnostics.values().map(Vec::len).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_result_is_clean() {
        let result = BuildResult::default();
        assert!(!result.has_errors());
        assert_eq!(result.diagnostic_count(), 0);
    }

    #[test]
    fn file_error_counts() {
        let mut result = BuildResult::default();
        result.diagnostics.insert(
            PathBuf::from("/p/A.sol"),
            vec![Diagnostic::warning("unused"), Diagnostic::error("boom")],
        );
        assert!(result.has_errors());
        assert_eq!(result.diagnostic_count(), 2);
    }

    #[test]
    fn warnings_only_is_clean() {
        let mut result = BuildResult::default();
        result.global_diagnostics.push(Diagnostic::warning("w"));
        assert!(!result.has_errors());
    }
}
