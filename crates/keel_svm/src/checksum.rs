//! SHA-256 and Keccak-256 verification of downloaded binaries.

use crate::error::SvmError;
use crate::listing::SolcBuildInfo;
use sha2::{Digest, Sha256};
use sha3::Keccak256;
use std::path::Path;

/// Hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Hex Keccak-256 of `bytes`.
pub fn keccak256_hex(bytes: &[u8]) -> String {
    hex::encode(Keccak256::digest(bytes))
}

fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x").unwrap_or(s)
}

fn compare(path: &Path, expected: &str, actual: String) -> Result<(), SvmError> {
    let expected = strip_0x(expected);
    if expected.eq_ignore_ascii_case(&actual) {
        Ok(())
    } else {
        Err(SvmError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: expected.to_string(),
            actual,
        })
    }
}

/// Checks the file at `path` against both checksums of `build`.
pub fn verify(path: &Path, build: &SolcBuildInfo) -> Result<(), SvmError> {
    let bytes = std::fs::read(path).map_err(|e| SvmError::io(path, e))?;
    compare(path, &build.sha256, sha256_hex(&bytes))?;
    compare(path, &build.keccak256, keccak256_hex(&bytes))
}
