//! The `list.json` release listing published per platform.

use crate::error::SvmError;
use keel_common::SemanticVersion;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One build entry of the release listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolcBuildInfo {
    /// File name relative to the platform directory.
    pub path: String,
    /// Release version.
    pub version: SemanticVersion,
    /// Build identifier, e.g. `commit.7dd6d404`.
    pub build: String,
    /// Version with the build suffix, e.g. `0.8.19+commit.7dd6d404`.
    #[serde(rename = "longVersion")]
    pub long_version: String,
    /// Keccak-256 of the file, `0x`-prefixed.
    pub keccak256: String,
    /// SHA-256 of the file, `0x`-prefixed.
    pub sha256: String,
    /// Content-addressed mirror URLs.
    #[serde(default)]
    pub urls: Vec<String>,
}

/// The release listing of one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolcBuilds {
    /// Every build, including nightlies.
    pub builds: Vec<SolcBuildInfo>,
    /// Release version to file name.
    pub releases: BTreeMap<SemanticVersion, String>,
    /// The newest release.
    #[serde(rename = "latestRelease")]
    pub latest_release: String,
}

impl SolcBuilds {
    /// Parses a listing from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SvmError> {
        serde_json::from_slice(bytes).map_err(|e| SvmError::ListParse {
            reason: e.to_string(),
        })
    }

    /// Release versions, oldest first.
    pub fn versions(&self) -> Vec<SemanticVersion> {
        self.releases.keys().cloned().collect()
    }

    /// The build entry of a release. Nightly builds share the numeric
    /// version, so the entry whose path is the release file wins.
    pub fn build(&self, version: &SemanticVersion) -> Option<&SolcBuildInfo> {
        let filename = self.releases.get(version);
        self.builds
            .iter()
            .filter(|b| b.version == *version)
            .find(|b| filename.is_none_or(|f| *f == b.path))
    }

    /// The release file name for `version`.
    ///
    /// Versions older than the first release are unsupported; other
    /// unlisted versions are unknown.
    pub fn filename(&self, version: &SemanticVersion) -> Result<&str, SvmError> {
        if let Some(minimum) = self.releases.keys().next() {
            if version < minimum {
                return Err(SvmError::UnsupportedVersion {
                    version: version.clone(),
                    minimum: minimum.clone(),
                });
            }
        }
        self.releases
            .get(version)
            .map(String::as_str)
            .ok_or_else(|| SvmError::UnknownVersion {
                version: version.clone(),
            })
    }
}
