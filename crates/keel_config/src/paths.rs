//! Filesystem locations: the global data directory and path normalization.

use crate::error::ConfigError;
use std::path::{Component, Path, PathBuf};

/// Environment variable overriding the global data directory.
pub const DATA_HOME_ENV: &str = "KEEL_DATA_HOME";

/// Returns the global data directory holding installed compilers, the cached
/// release listing, and the build signing key.
///
/// `$KEEL_DATA_HOME` wins; otherwise `<platform data dir>/keel`.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    if let Some(dir) = std::env::var_os(DATA_HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::data_local_dir()
        .map(|d| d.join("keel"))
        .ok_or(ConfigError::NoDataDir)
}

/// Lexically normalizes `path` against `base`: relative paths are joined onto
/// `base`, and `.` and `..` components are resolved without touching the
/// filesystem.
pub fn normalize_path(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out
}
