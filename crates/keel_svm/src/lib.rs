//! Compiler version management: listing, installing, verifying, and
//! selecting `solc` releases.
//!
//! Release binaries are listed and downloaded from the official binaries
//! mirror, with the GitHub mirror as a fallback. The [`SolcVersionManager`]
//! keeps one directory per installed release under
//! `{data}/compilers/`, and [`select_version`] picks the release each
//! compilation unit is built with.

#![warn(missing_docs)]

pub mod checksum;
pub mod error;
pub mod listing;
pub mod manager;
pub mod platform;
pub mod select;
pub mod source;
pub mod unzip;

pub use error::SvmError;
pub use listing::{SolcBuildInfo, SolcBuilds};
pub use manager::{SolcVersionManager, BINARIES_URL, GITHUB_URL, INSTALL_RETRY_COUNT};
pub use platform::Platform;
pub use select::{select_version, SelectionError};
pub use source::{HttpSource, Progress, ReleaseSource};
