//! Error types for configuration loading and validation.

/// Errors that can occur when loading or validating a `keel.toml` configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// An import remapping is not of the form `[context:]prefix=target`.
    #[error("invalid remapping '{0}'")]
    InvalidRemapping(String),

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// No per-user data directory could be determined.
    #[error("cannot determine data directory; set KEEL_DATA_HOME")]
    NoDataDir,
}
