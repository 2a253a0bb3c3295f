//! Error types for compiler invocation.

use std::path::PathBuf;

/// Errors raised while running the compiler.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The compiler process could not be started.
    #[error("failed to start {binary}: {source}")]
    Spawn {
        /// The compiler binary.
        binary: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// Communicating with the running process failed.
    #[error("compiler I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The compiler exited unsuccessfully.
    #[error("solc exited with {status}: {stderr}")]
    SolcFailed {
        /// The exit status.
        status: String,
        /// Everything the process wrote to stderr.
        stderr: String,
    },

    /// The compiler's stdout is not a standard JSON output document.
    #[error("malformed compiler output: {reason}")]
    MalformedOutput {
        /// Description of the parse failure.
        reason: String,
    },

    /// The input document could not be serialized.
    #[error("cannot serialize compiler input: {reason}")]
    Serialize {
        /// Description of the failure.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solc_failed_display() {
        let err = DriverError::SolcFailed {
            status: "exit status: 1".into(),
            stderr: "Invalid option".into(),
        };
        assert_eq!(err.to_string(), "solc exited with exit status: 1: Invalid option");
    }

    #[test]
    fn spawn_display() {
        let err = DriverError::Spawn {
            binary: PathBuf::from("/data/solc"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(err.to_string(), "failed to start /data/solc: not found");
    }
}
