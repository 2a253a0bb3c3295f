//! Error types for name resolution and graph construction.

use keel_source::PreParseError;
use std::path::PathBuf;

/// Errors raised while resolving names or building the import graph.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// A command-line path lies outside the project root, every include
    /// path, and the bundled library path.
    #[error("'{}' is not inside the project root or any include path", .path.display())]
    OutsideRoots {
        /// The rejected path.
        path: PathBuf,
    },

    /// A seed file does not exist.
    #[error("file not found: {}", .path.display())]
    SeedNotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// An import could not be located under any root.
    #[error("import '{name}' not found{}", .importer.as_deref().map(|i| format!(" (imported from '{i}')")).unwrap_or_default())]
    ImportNotFound {
        /// The source unit name that was looked up.
        name: String,
        /// The importing source unit, if known.
        importer: Option<String>,
    },

    /// A source unit name matches files under more than one root.
    #[error("import '{name}' is ambiguous: {}", .candidates.iter().map(|c| c.display().to_string()).collect::<Vec<_>>().join(", "))]
    AmbiguousImport {
        /// The ambiguous source unit name.
        name: String,
        /// Every matching file.
        candidates: Vec<PathBuf>,
    },

    /// Two different files resolved to the same source unit name.
    #[error("source unit name '{name}' refers to both '{}' and '{}'", .first.display(), .second.display())]
    DuplicateSourceUnitName {
        /// The clashing name.
        name: String,
        /// The path bound first.
        first: PathBuf,
        /// The conflicting path.
        second: PathBuf,
    },

    /// A file could not be read.
    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// A file is not valid UTF-8.
    #[error("'{}' is not valid UTF-8", .path.display())]
    InvalidUtf8 {
        /// The offending file.
        path: PathBuf,
    },

    /// A file's pragmas or imports are malformed.
    #[error("{}: {source}", .path.display())]
    PreParse {
        /// The offending file.
        path: PathBuf,
        /// The pre-parser failure.
        source: PreParseError,
    },
}

impl GraphError {
    /// Attaches the importing source unit to an [`ImportNotFound`](Self::ImportNotFound) error.
    pub fn with_importer(self, importer: &str) -> Self {
        match self {
            GraphError::ImportNotFound { name, .. } => GraphError::ImportNotFound {
                name,
                importer: Some(importer.to_string()),
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_import_not_found() {
        let err = GraphError::ImportNotFound {
            name: "lib/Missing.sol".into(),
            importer: None,
        };
        assert_eq!(err.to_string(), "import 'lib/Missing.sol' not found");
        let err = err.with_importer("contracts/A.sol");
        assert_eq!(
            err.to_string(),
            "import 'lib/Missing.sol' not found (imported from 'contracts/A.sol')"
        );
    }

    #[test]
    fn display_ambiguous() {
        let err = GraphError::AmbiguousImport {
            name: "x.sol".into(),
            candidates: vec![PathBuf::from("/a/x.sol"), PathBuf::from("/b/x.sol")],
        };
        assert_eq!(err.to_string(), "import 'x.sol' is ambiguous: /a/x.sol, /b/x.sol");
    }

    #[test]
    fn display_duplicate() {
        let err = GraphError::DuplicateSourceUnitName {
            name: "A.sol".into(),
            first: PathBuf::from("/p/A.sol"),
            second: PathBuf::from("/q/A.sol"),
        };
        assert_eq!(
            err.to_string(),
            "source unit name 'A.sol' refers to both '/p/A.sol' and '/q/A.sol'"
        );
    }
}
