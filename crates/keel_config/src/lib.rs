//! Parsing and validation of `keel.toml` project configuration files.
//!
//! This crate reads the project configuration and produces a strongly-typed
//! [`KeelConfig`]: compiler settings, include/allow/exclude paths, import
//! remappings, the supported compiler version window, and build options. It
//! also locates the global data directory where compilers and the cache
//! signing key live.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod paths;
pub mod remapping;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_file, load_config_from_str, CONFIG_FILE_NAME};
pub use paths::{data_dir, normalize_path, DATA_HOME_ENV};
pub use remapping::Remapping;
pub use types::*;
