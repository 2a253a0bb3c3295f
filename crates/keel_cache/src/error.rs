//! Error types for cache operations.

use std::path::PathBuf;

/// Errors that can occur while writing the build cache.
///
/// Reads are fail-safe: a missing, incompatible, or corrupt cache is a
/// cache miss and triggers a full rebuild. These errors surface only when
/// persisting a finished build.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing cache files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The signing key file exists but is not a valid key.
    #[error("invalid build key at {path}: {reason}")]
    InvalidKey {
        /// The key file path.
        path: PathBuf,
        /// Description of the problem.
        reason: String,
    },

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },
}
