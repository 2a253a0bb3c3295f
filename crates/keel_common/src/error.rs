//! Error types for version and version-expression parsing.

/// Errors raised while parsing versions or version range expressions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    /// The input is not a valid `MAJOR.MINOR.PATCH[-pre][+build]` version.
    #[error("invalid version '{input}': {reason}")]
    InvalidVersion {
        /// The rejected input.
        input: String,
        /// Why the input was rejected.
        reason: String,
    },

    /// The input is not a valid version range expression.
    #[error("invalid version expression '{input}': {reason}")]
    InvalidExpression {
        /// The rejected expression.
        input: String,
        /// Why the expression was rejected.
        reason: String,
    },
}

impl VersionError {
    pub(crate) fn version(input: &str, reason: impl Into<String>) -> Self {
        Self::InvalidVersion {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn expression(input: &str, reason: impl Into<String>) -> Self {
        Self::InvalidExpression {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}
