//! Per-unit build failures.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use keel_common::{SemanticVersion, VersionRanges};
use keel_diagnostics::Diagnostic;
use keel_graph::CompilationUnit;
use keel_svm::SelectionError;

/// Why a compilation unit produced no compiler output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FailureReason {
    /// The members' pragmas have no version in common.
    #[error("the version pragmas of these files have no compiler version in common")]
    EmptyVersionRange,

    /// No compiler release could be chosen.
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// The chosen release could not be installed.
    #[error("cannot install solc {version}: {reason}")]
    Install {
        /// The chosen release.
        version: SemanticVersion,
        /// The install error.
        reason: String,
    },

    /// The compiler process failed or produced unreadable output.
    #[error("solc {version} failed: {reason}")]
    Compile {
        /// The release that was run.
        version: SemanticVersion,
        /// The driver error, including the compiler's stderr.
        reason: String,
    },
}

/// A compilation unit that could not be compiled.
///
/// Failures are data: sibling units still compile, and the build result
/// carries every failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFailure {
    /// Source unit names of the unit's members.
    pub names: BTreeSet<String>,
    /// Files of the unit's members.
    pub files: BTreeSet<PathBuf>,
    /// The unit's allowed versions.
    pub versions: VersionRanges,
    /// What went wrong.
    pub reason: FailureReason,
}

impl UnitFailure {
    /// Records `reason` against `unit`.
    pub fn new(unit: &CompilationUnit, reason: FailureReason) -> Self {
        Self {
            names: unit.names.clone(),
            files: unit.files.clone(),
            versions: unit.versions.clone(),
            reason,
        }
    }

    /// An error diagnostic describing the failure.
    pub fn diagnostic(&self) -> Diagnostic {
        let files = self
            .files
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Diagnostic::error(self.reason.to_string())
            .with_kind("BuildError")
            .with_note(format!("allowed versions: {}", self.versions))
            .with_note(format!("files: {files}"))
    }
}

impl fmt::Display for UnitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (", self.reason)?;
        for (i, name) in self.names.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(name)?;
        }
        f.write_str(")")
    }
}
