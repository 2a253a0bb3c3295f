//! The signed binary companion of `build.json`.
//!
//! `build.bin` holds a header (magic bytes, format version, tool version,
//! payload checksum) followed by the bincode payload. `build.bin.sig` holds
//! a keyed BLAKE3 signature of the whole file.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use keel_common::ContentHash;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;
use crate::key::BuildKey;

/// Name of the artifact file within the build directory.
pub const ARTIFACT_FILE: &str = "build.bin";

/// Name of the detached signature file within the build directory.
pub const SIGNATURE_FILE: &str = "build.bin.sig";

/// Magic bytes identifying a keel build artifact.
const ARTIFACT_MAGIC: [u8; 4] = *b"KEEL";

/// Current artifact format version. Increment on breaking changes to
/// the header or payload format.
const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Header prepended to the artifact payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ArtifactHeader {
    magic: [u8; 4],
    format_version: u32,
    tool_version: String,
    checksum: ContentHash,
}

/// The object graph of the previous build.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BuildArtifact {
    /// Source unit name to file path.
    pub source_units: BTreeMap<String, PathBuf>,
    /// Member names of every compilation unit.
    pub units: Vec<BTreeSet<String>>,
    /// Import edges as `(importee, importer)`.
    pub edges: Vec<(String, String)>,
    /// Source unit name to its AST, as JSON text.
    pub asts: BTreeMap<String, String>,
}

impl BuildArtifact {
    /// Encodes the artifact with its header.
    pub fn encode(&self, tool_version: &str) -> Result<Vec<u8>, CacheError> {
        let payload = bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;
        let header = ArtifactHeader {
            magic: ARTIFACT_MAGIC,
            format_version: ARTIFACT_FORMAT_VERSION,
            tool_version: tool_version.to_string(),
            checksum: ContentHash::from_bytes(&payload),
        };
        let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;

        // 4-byte header length (little-endian) + header + payload
        let header_len = header_bytes.len() as u32;
        let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
        output.extend_from_slice(&header_len.to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(&payload);
        Ok(output)
    }

    /// Decodes an artifact written by `tool_version`.
    ///
    /// Returns `None` on any header, version, or checksum problem.
    pub fn decode(raw: &[u8], tool_version: &str) -> Option<Self> {
        if raw.len() < 4 {
            return None;
        }
        let header_len = u32::from_le_bytes(raw[..4].try_into().ok()?) as usize;
        if raw.len() < 4 + header_len {
            return None;
        }
        let header: ArtifactHeader =
            bincode::serde::decode_from_slice(&raw[4..4 + header_len], bincode::config::standard())
                .ok()?
                .0;
        if header.magic != ARTIFACT_MAGIC
            || header.format_version != ARTIFACT_FORMAT_VERSION
            || header.tool_version != tool_version
        {
            return None;
        }
        let payload = &raw[4 + header_len..];
        if ContentHash::from_bytes(payload) != header.checksum {
            return None;
        }
        bincode::serde::decode_from_slice(payload, bincode::config::standard())
            .ok()
            .map(|(artifact, _)| artifact)
    }

    /// Writes `build.bin` and its signature to `build_dir`.
    pub fn save(&self, build_dir: &Path, tool_version: &str, key: &BuildKey) -> Result<(), CacheError> {
        let bytes = self.encode(tool_version)?;
        std::fs::create_dir_all(build_dir).map_err(|e| CacheError::Io {
            path: build_dir.to_path_buf(),
            source: e,
        })?;
        crate::write_atomic(&build_dir.join(ARTIFACT_FILE), &bytes)?;
        crate::write_atomic(&build_dir.join(SIGNATURE_FILE), key.sign(&bytes).as_bytes())
    }

    /// Reads `build.bin` from `build_dir`, checking its signature.
    ///
    /// Fail-safe: any problem is a cache miss.
    pub fn load(build_dir: &Path, tool_version: &str, key: &BuildKey) -> Option<Self> {
        let raw = std::fs::read(build_dir.join(ARTIFACT_FILE)).ok()?;
        let signature = std::fs::read_to_string(build_dir.join(SIGNATURE_FILE)).ok()?;
        if !key.verify(&raw, &signature) {
            tracing::warn!("build artifact signature does not match, ignoring previous build");
            return None;
        }
        Self::decode(&raw, tool_version)
    }
}
