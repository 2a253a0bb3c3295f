//! Incremental build cache.
//!
//! The previous build is recorded as a JSON [`BuildInfo`] plus a signed
//! binary [`BuildArtifact`] under `.keel/build/`. Comparing it with the
//! current import graph tells which compilation units must be recompiled
//! and which files need their downstream outputs rebuilt.

#![warn(missing_docs)]

pub mod artifact;
pub mod cache;
pub mod changes;
pub mod error;
pub mod info;
pub mod key;

pub use artifact::BuildArtifact;
pub use cache::{BuildCache, PreviousBuild};
pub use changes::{detect_changes, files_to_rebuild, select_units, ChangeSet};
pub use error::CacheError;
pub use info::{BuildFingerprint, BuildInfo, SourceUnitInfo, UnitBuildInfo};
pub use key::BuildKey;

use std::path::Path;

/// Writes `bytes` to a sibling `*.tmp` file, then renames it over `path`.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);
    std::fs::write(&tmp, bytes).map_err(|e| CacheError::Io {
        path: tmp.clone(),
        source: e,
    })?;
    std::fs::rename(&tmp, path).map_err(|e| CacheError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
