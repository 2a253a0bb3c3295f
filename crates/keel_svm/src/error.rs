//! Error types for compiler version management.

use keel_common::SemanticVersion;
use std::path::PathBuf;

/// Errors raised while listing, installing, or removing compilers.
#[derive(Debug, thiserror::Error)]
pub enum SvmError {
    /// No prebuilt compiler binaries exist for this operating system and
    /// architecture.
    #[error("solc binaries are not available for {os}-{arch}")]
    UnsupportedPlatform {
        /// The operating system.
        os: String,
        /// The CPU architecture.
        arch: String,
    },

    /// Neither mirror served a release list and no cached copy exists.
    #[error("unable to fetch the solc release list: {reason}")]
    ListUnavailable {
        /// The last failure.
        reason: String,
    },

    /// The release list is not valid JSON of the expected shape.
    #[error("malformed solc release list: {reason}")]
    ListParse {
        /// Description of the parse failure.
        reason: String,
    },

    /// The version predates the oldest release available for this platform.
    #[error("solc {version} is not available; the oldest release for this platform is {minimum}")]
    UnsupportedVersion {
        /// The requested version.
        version: SemanticVersion,
        /// The oldest listed release.
        minimum: SemanticVersion,
    },

    /// The version is not a listed release.
    #[error("solc version {version} does not exist")]
    UnknownVersion {
        /// The requested version.
        version: SemanticVersion,
    },

    /// The version has no installation directory.
    #[error("solc {version} is not installed")]
    NotInstalled {
        /// The requested version.
        version: SemanticVersion,
    },

    /// A downloaded file does not match the listed checksum.
    #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The downloaded file.
        path: PathBuf,
        /// The listed checksum.
        expected: String,
        /// The checksum of the file on disk.
        actual: String,
    },

    /// An HTTP request failed.
    #[error("download of {url} failed: {reason}")]
    Download {
        /// The requested URL.
        url: String,
        /// Description of the failure.
        reason: String,
    },

    /// A filesystem operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path involved.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// A release archive could not be unpacked.
    #[error("cannot extract {path}: {reason}")]
    Archive {
        /// The archive path.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },
}

impl SvmError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SvmError::Io {
            path: path.into(),
            source,
        }
    }
}
