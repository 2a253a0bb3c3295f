//! High-level build cache.
//!
//! `BuildCache` ties the build info, the signed artifact, and the signing key
//! together for the build coordinator: load the previous build if it can be
//! reused, and persist the new one once every unit has finished.

use std::path::{Path, PathBuf};

use crate::artifact::{BuildArtifact, ARTIFACT_FILE, SIGNATURE_FILE};
use crate::error::CacheError;
use crate::info::{BuildFingerprint, BuildInfo, BUILD_INFO_FILE};
use crate::key::BuildKey;

/// A previous build that may be reused.
#[derive(Debug, Clone)]
pub struct PreviousBuild {
    /// The build record.
    pub info: BuildInfo,
    /// The verified object graph.
    pub artifact: BuildArtifact,
}

/// The on-disk cache of one project.
pub struct BuildCache {
    /// `{project}/.keel/build`.
    build_dir: PathBuf,

    /// Global data directory holding the signing key.
    data_dir: PathBuf,

    /// Tool version for compatibility checks.
    tool_version: String,
}

impl BuildCache {
    /// Creates a cache rooted at `build_dir`.
    pub fn new(build_dir: &Path, data_dir: &Path, tool_version: &str) -> Self {
        Self {
            build_dir: build_dir.to_path_buf(),
            data_dir: data_dir.to_path_buf(),
            tool_version: tool_version.to_string(),
        }
    }

    /// The build directory.
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Loads the previous build if it was produced by this tool version with
    /// the same `fingerprint` and its artifact verifies.
    ///
    /// Fail-safe: every problem reads as `None`, which means a full rebuild.
    pub fn load(&self, fingerprint: &BuildFingerprint) -> Option<PreviousBuild> {
        let info = BuildInfo::load(&self.build_dir)?;
        if info.tool_version != self.tool_version {
            tracing::info!(
                "tool version changed from {} to {} since the last build",
                info.tool_version,
                self.tool_version
            );
            return None;
        }
        if !info.is_compatible(&self.tool_version, fingerprint) {
            tracing::debug!("build settings changed");
            return None;
        }
        let Some(key) = BuildKey::load(&self.data_dir) else {
            tracing::warn!("no build key found, cannot verify the previous build");
            return None;
        };
        let artifact = BuildArtifact::load(&self.build_dir, &self.tool_version, &key)?;
        tracing::debug!(
            units = info.compilation_units.len(),
            sources = info.source_units.len(),
            "loaded previous build"
        );
        Some(PreviousBuild { info, artifact })
    }

    /// Persists a finished build.
    ///
    /// The artifact and its signature are written before `build.json`, so a
    /// crash in between leaves an info file that fails verification.
    pub fn store(&self, info: &BuildInfo, artifact: &BuildArtifact) -> Result<(), CacheError> {
        let key = BuildKey::load_or_create(&self.data_dir)?;
        artifact.save(&self.build_dir, &self.tool_version, &key)?;
        info.save(&self.build_dir)
    }

    /// Removes every cache file.
    pub fn clear(&self) -> Result<(), CacheError> {
        for name in [BUILD_INFO_FILE, ARTIFACT_FILE, SIGNATURE_FILE] {
            let path = self.build_dir.join(name);
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(CacheError::Io { path, source: e }),
            }
        }
        Ok(())
    }
}
