//! Project-wide build errors.

use keel_common::SemanticVersion;
use keel_graph::GraphError;
use keel_svm::SvmError;

/// Errors that abort a whole build.
///
/// Failures confined to one compilation unit are reported as
/// [`UnitFailure`](crate::UnitFailure)s in the build result instead.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// The pinned compiler version is below the configured minimum.
    #[error("target version {target} is below the minimum supported version {min}")]
    TargetBelowMinimum {
        /// The pinned version.
        target: SemanticVersion,
        /// The configured minimum.
        min: SemanticVersion,
    },

    /// The pinned compiler version is above the configured maximum.
    #[error("target version {target} is above the maximum supported version {max}")]
    TargetAboveMaximum {
        /// The pinned version.
        target: SemanticVersion,
        /// The configured maximum.
        max: SemanticVersion,
    },

    /// The import graph could not be built.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// The list of compiler releases could not be obtained.
    #[error("cannot list solc versions: {0}")]
    VersionList(#[source] SvmError),

    /// A background task panicked.
    #[error("build task failed: {reason}")]
    Task {
        /// The join error.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_display() {
        let err = CompileError::TargetBelowMinimum {
            target: SemanticVersion::new(0, 5, 0),
            min: SemanticVersion::new(0, 6, 2),
        };
        assert_eq!(
            err.to_string(),
            "target version 0.5.0 is below the minimum supported version 0.6.2"
        );
    }

    #[test]
    fn version_list_display() {
        let err = CompileError::VersionList(SvmError::ListUnavailable {
            reason: "offline".into(),
        });
        assert!(err.to_string().starts_with("cannot list solc versions"));
        assert!(err.to_string().contains("offline"));
    }
}
