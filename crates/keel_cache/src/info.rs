//! The JSON record of the previous build.
//!
//! Stored as `build.json` in the build directory. It records every
//! compilation unit's diagnostics by unit hash, every source unit's path and
//! content hash, and the settings the build ran with.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use keel_common::{ContentHash, SemanticVersion};
use keel_diagnostics::Diagnostic;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Name of the build info file within the build directory.
pub const BUILD_INFO_FILE: &str = "build.json";

/// Settings that must match for a previous build to be reused.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BuildFingerprint {
    /// Configured `allow_paths`.
    pub allow_paths: Vec<PathBuf>,
    /// Configured `exclude_paths`.
    pub exclude_paths: Vec<PathBuf>,
    /// Configured `include_paths`.
    pub include_paths: Vec<PathBuf>,
    /// The compiler settings document the units were compiled with.
    pub settings: serde_json::Value,
    /// The pinned compiler version, if any.
    pub target_version: Option<SemanticVersion>,
    /// Whether units were kept separate instead of merged.
    pub incremental: bool,
}

/// Diagnostics produced by one compilation unit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnitBuildInfo {
    /// Every error, warning, and info the compiler reported.
    pub errors: Vec<Diagnostic>,
}

/// Where a source unit was read from and what it contained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUnitInfo {
    /// The file backing the source unit.
    pub fs_path: PathBuf,
    /// Hash of the file's contents.
    pub content_hash: ContentHash,
}

/// The record of a finished build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildInfo {
    /// Version of the tool that produced the build.
    pub tool_version: String,
    /// Hex unit hash to that unit's diagnostics.
    pub compilation_units: BTreeMap<String, UnitBuildInfo>,
    /// Source unit name to its file and content hash.
    pub source_units: BTreeMap<String, SourceUnitInfo>,
    /// Settings the build ran with.
    #[serde(flatten)]
    pub fingerprint: BuildFingerprint,
}

impl BuildInfo {
    /// Creates an empty record.
    pub fn new(tool_version: &str, fingerprint: BuildFingerprint) -> Self {
        Self {
            tool_version: tool_version.to_string(),
            compilation_units: BTreeMap::new(),
            source_units: BTreeMap::new(),
            fingerprint,
        }
    }

    /// Returns `true` if a build with `tool_version` and `fingerprint` may
    /// reuse this record.
    pub fn is_compatible(&self, tool_version: &str, fingerprint: &BuildFingerprint) -> bool {
        self.tool_version == tool_version && self.fingerprint == *fingerprint
    }

    /// Diagnostics stored for the unit with `hash`.
    pub fn unit(&self, hash: &ContentHash) -> Option<&UnitBuildInfo> {
        self.compilation_units.get(&hash.to_hex())
    }

    /// Loads the record from `build_dir`, returning `None` if it is missing
    /// or unreadable.
    pub fn load(build_dir: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(build_dir.join(BUILD_INFO_FILE)).ok()?;
        match serde_json::from_str(&content) {
            Ok(info) => Some(info),
            Err(e) => {
                tracing::debug!("ignoring unreadable {BUILD_INFO_FILE}: {e}");
                None
            }
        }
    }

    /// Writes the record to `build_dir` atomically.
    pub fn save(&self, build_dir: &Path) -> Result<(), CacheError> {
        std::fs::create_dir_all(build_dir).map_err(|e| CacheError::Io {
            path: build_dir.to_path_buf(),
            source: e,
        })?;
        let json = serde_json::to_vec_pretty(self).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;
        crate::write_atomic(&build_dir.join(BUILD_INFO_FILE), &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fingerprint() -> BuildFingerprint {
        BuildFingerprint {
            include_paths: vec![PathBuf::from("node_modules")],
            settings: serde_json::json!({"optimizer": {"runs": 200}}),
            incremental: true,
            ..BuildFingerprint::default()
        }
    }

    fn info() -> BuildInfo {
        let mut info = BuildInfo::new("0.1.0", fingerprint());
        let hash = ContentHash::from_bytes(b"unit");
        info.compilation_units.insert(
            hash.to_hex(),
            UnitBuildInfo {
                errors: vec![Diagnostic::warning("unused variable").with_code("2072")],
            },
        );
        info.source_units.insert(
            "src/A.sol".into(),
            SourceUnitInfo {
                fs_path: PathBuf::from("/p/src/A.sol"),
                content_hash: ContentHash::from_bytes(b"contract A {}"),
            },
        );
        info
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let info = info();
        info.save(dir.path()).unwrap();
        assert_eq!(BuildInfo::load(dir.path()).unwrap(), info);
        assert!(!dir.path().join("build.json.tmp").exists());
    }

    #[test]
    fn flattened_json_layout() {
        let value = serde_json::to_value(info()).unwrap();
        assert_eq!(value["tool_version"], "0.1.0");
        assert_eq!(value["include_paths"][0], "node_modules");
        assert_eq!(value["incremental"], true);
        assert!(value["target_version"].is_null());
        assert_eq!(
            value["source_units"]["src/A.sol"]["content_hash"],
            ContentHash::from_bytes(b"contract A {}").to_hex()
        );
    }

    #[test]
    fn load_missing_or_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        assert!(BuildInfo::load(dir.path()).is_none());
        std::fs::write(dir.path().join(BUILD_INFO_FILE), "{ not json").unwrap();
        assert!(BuildInfo::load(dir.path()).is_none());
    }

    #[test]
    fn compatibility() {
        let info = info();
        assert!(info.is_compatible("0.1.0", &fingerprint()));
        assert!(!info.is_compatible("0.2.0", &fingerprint()));

        let mut changed = fingerprint();
        changed.target_version = Some(SemanticVersion::new(0, 8, 19));
        assert!(!info.is_compatible("0.1.0", &changed));

        let mut changed = fingerprint();
        changed.settings = serde_json::json!({"optimizer": {"runs": 1}});
        assert!(!info.is_compatible("0.1.0", &changed));
    }

    #[test]
    fn unit_lookup_by_hash() {
        let info = info();
        let stored = info.unit(&ContentHash::from_bytes(b"unit")).unwrap();
        assert_eq!(stored.errors[0].code.as_deref(), Some("2072"));
        assert!(info.unit(&ContentHash::ZERO).is_none());
    }
}
