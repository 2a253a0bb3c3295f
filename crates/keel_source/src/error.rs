//! Error types for the pre-parser.

use keel_common::VersionError;

/// Errors raised by the pre-parser in strict mode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreParseError {
    /// A `pragma solidity` directive carries an invalid version expression.
    #[error("invalid version pragma '{expression}': {source}")]
    InvalidPragma {
        /// The expression text between `solidity` and `;`.
        expression: String,
        /// The underlying parse failure.
        source: VersionError,
    },

    /// An `import` directive could not be parsed.
    #[error("invalid import '{clause}': {reason}")]
    InvalidImport {
        /// The import clause between `import` and `;`.
        clause: String,
        /// Why the clause was rejected.
        reason: String,
    },

    /// The source is not valid UTF-8.
    #[error("source is not valid UTF-8 at byte {offset}")]
    InvalidUtf8 {
        /// Offset of the first invalid byte.
        offset: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_import() {
        let err = PreParseError::InvalidImport {
            clause: "{A from \"a.sol\"".into(),
            reason: "unterminated symbol list".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid import '{A from \"a.sol\"': unterminated symbol list"
        );
    }

    #[test]
    fn display_invalid_pragma_includes_cause() {
        let source = "^0.0.0".parse::<keel_common::VersionRanges>().unwrap_err();
        let err = PreParseError::InvalidPragma {
            expression: "^0.0.0".into(),
            source,
        };
        let msg = err.to_string();
        assert!(msg.starts_with("invalid version pragma '^0.0.0'"));
        assert!(msg.contains("matches nothing"));
    }
}
