//! Semantic versions as used by the Solidity compiler release listing.

use crate::error::VersionError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// A single `MAJOR.MINOR.PATCH[-prerelease][+build]` version.
///
/// Pre-release and build strings are kept for display but ignored by
/// equality, ordering and hashing: `0.8.0-nightly.2021.1.1` equals `0.8.0`.
#[derive(Clone)]
pub struct SemanticVersion {
    /// Major component.
    pub major: u64,
    /// Minor component.
    pub minor: u64,
    /// Patch component.
    pub patch: u64,
    /// Optional dot-separated pre-release identifiers.
    pub prerelease: Option<String>,
    /// Optional dot-separated build identifiers.
    pub build: Option<String>,
}

impl SemanticVersion {
    /// Creates a version without pre-release or build parts.
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: None,
            build: None,
        }
    }

    /// The smallest version, `0.0.0`.
    pub const fn zero() -> Self {
        Self::new(0, 0, 0)
    }

    fn key(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }
}

impl PartialEq for SemanticVersion {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for SemanticVersion {}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl Hash for SemanticVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.prerelease {
            write!(f, "-{pre}")?;
        }
        if let Some(build) = &self.build {
            write!(f, "+{build}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SemanticVersion({self})")
    }
}

/// Parses a numeric component: `0` or a number without a leading zero.
pub(crate) fn parse_number(input: &str, part: &str) -> Result<u64, VersionError> {
    if part.is_empty() {
        return Err(VersionError::version(input, "empty numeric component"));
    }
    if !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VersionError::version(
            input,
            format!("'{part}' is not a number"),
        ));
    }
    if part.len() > 1 && part.starts_with('0') {
        return Err(VersionError::version(
            input,
            format!("'{part}' has a leading zero"),
        ));
    }
    part.parse()
        .map_err(|_| VersionError::version(input, format!("'{part}' is out of range")))
}

/// Validates dot-separated `[-0-9A-Za-z]+` identifiers.
pub(crate) fn is_identifier_list(s: &str) -> bool {
    !s.is_empty()
        && s.split('.').all(|part| {
            !part.is_empty()
                && part
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'-')
        })
}

impl FromStr for SemanticVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (rest, build) = match s.split_once('+') {
            Some((rest, build)) => {
                if !is_identifier_list(build) {
                    return Err(VersionError::version(s, "malformed build metadata"));
                }
                (rest, Some(build.to_string()))
            }
            None => (s, None),
        };
        let (core, prerelease) = match rest.split_once('-') {
            Some((core, pre)) => {
                if !is_identifier_list(pre) {
                    return Err(VersionError::version(s, "malformed pre-release"));
                }
                (core, Some(pre.to_string()))
            }
            None => (rest, None),
        };

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() != 3 {
            return Err(VersionError::version(
                s,
                "expected MAJOR.MINOR.PATCH",
            ));
        }
        Ok(SemanticVersion {
            major: parse_number(s, parts[0])?,
            minor: parse_number(s, parts[1])?,
            patch: parse_number(s, parts[2])?,
            prerelease,
            build,
        })
    }
}

impl Serialize for SemanticVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SemanticVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> SemanticVersion {
        s.parse().unwrap()
    }

    #[test]
    fn parse_plain() {
        let ver = v("0.8.19");
        assert_eq!((ver.major, ver.minor, ver.patch), (0, 8, 19));
        assert!(ver.prerelease.is_none());
        assert!(ver.build.is_none());
    }

    #[test]
    fn parse_prerelease_and_build() {
        let ver = v("0.8.0-nightly.2021.1.8+commit.abc-1");
        assert_eq!(ver.prerelease.as_deref(), Some("nightly.2021.1.8"));
        assert_eq!(ver.build.as_deref(), Some("commit.abc-1"));
        assert_eq!(ver.to_string(), "0.8.0-nightly.2021.1.8+commit.abc-1");
    }

    #[test]
    fn suffixes_ignored_in_comparison() {
        assert_eq!(v("0.8.0-nightly"), v("0.8.0"));
        assert_eq!(v("0.8.0+commit.1"), v("0.8.0-rc.1"));
        assert!(v("0.8.0-nightly") < v("0.8.1"));
    }

    #[test]
    fn ordering() {
        assert!(v("0.4.26") < v("0.5.0"));
        assert!(v("0.8.9") < v("0.8.10"));
        assert!(v("1.0.0") > v("0.99.99"));
    }

    #[test]
    fn reject_malformed() {
        for bad in [
            "", "1", "1.2", "1.2.3.4", "01.2.3", "1.02.3", "a.b.c", "1.2.x", "1.2.3-", "1.2.3+",
            "1.2.3-a..b", "v1.2.3", " 1.2.3",
        ] {
            assert!(bad.parse::<SemanticVersion>().is_err(), "{bad:?} should fail");
        }
    }

    #[test]
    fn serde_as_string() {
        let ver = v("0.8.20");
        let json = serde_json::to_string(&ver).unwrap();
        assert_eq!(json, "\"0.8.20\"");
        let back: SemanticVersion = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ver);
        assert!(serde_json::from_str::<SemanticVersion>("\"0.8\"").is_err());
    }

    #[test]
    fn hash_ignores_suffixes() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(v("0.8.0"));
        assert!(set.contains(&v("0.8.0-nightly")));
    }
}
