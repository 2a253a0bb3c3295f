//! The per-user key signing build artifacts.

use std::path::{Path, PathBuf};

use crate::error::CacheError;

/// Name of the key file within the global data directory.
pub const BUILD_KEY_FILE: &str = "build.key";

const KEY_LEN: usize = 32;

/// A 32-byte BLAKE3 key kept in `{data}/build.key`.
///
/// Artifacts are signed with a keyed hash so a blob written by a different
/// user or edited by hand is rejected on read.
#[derive(Clone)]
pub struct BuildKey([u8; KEY_LEN]);

impl BuildKey {
    /// The key file inside `data_dir`.
    pub fn path(data_dir: &Path) -> PathBuf {
        data_dir.join(BUILD_KEY_FILE)
    }

    /// Reads the key, returning `None` if it is missing or malformed.
    pub fn load(data_dir: &Path) -> Option<Self> {
        let bytes = std::fs::read(Self::path(data_dir)).ok()?;
        let key: [u8; KEY_LEN] = bytes.try_into().ok()?;
        Some(Self(key))
    }

    /// Reads the key, generating and storing a fresh one if there is none
    /// or the stored one is malformed.
    pub fn load_or_create(data_dir: &Path) -> Result<Self, CacheError> {
        if let Some(key) = Self::load(data_dir) {
            return Ok(key);
        }
        let path = Self::path(data_dir);
        if path.exists() {
            tracing::warn!(path = %path.display(), "replacing malformed build key");
        }
        std::fs::create_dir_all(data_dir).map_err(|e| CacheError::Io {
            path: data_dir.to_path_buf(),
            source: e,
        })?;
        let key: [u8; KEY_LEN] = rand::random();
        crate::write_atomic(&path, &key)?;
        Ok(Self(key))
    }

    /// Hex signature of `data`.
    pub fn sign(&self, data: &[u8]) -> String {
        blake3::keyed_hash(&self.0, data).to_hex().to_string()
    }

    /// Returns `true` if `signature` was produced by [`sign`](Self::sign)
    /// over `data` with this key.
    pub fn verify(&self, data: &[u8], signature: &str) -> bool {
        match blake3::Hash::from_hex(signature.trim()) {
            // `blake3::Hash` equality is constant time.
            Ok(expected) => blake3::keyed_hash(&self.0, data) == expected,
            Err(_) => false,
        }
    }
}

impl std::fmt::Debug for BuildKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BuildKey(..)")
    }
}
