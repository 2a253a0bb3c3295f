//! Import remappings of the form `[context:]prefix=target`.

use crate::error::ConfigError;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static REMAPPING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<context>[^:\s]+)?:)?(?P<prefix>[^\s=]+)=(?P<target>[^\s]+)?$")
        .expect("remapping pattern is valid")
});

/// An import remapping, applied to import literals before path resolution.
///
/// The remapping only applies to imports made from source units whose name
/// starts with `context`; a missing context applies everywhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Remapping {
    /// Optional importer-name prefix restricting where the remapping applies.
    pub context: Option<String>,
    /// Import literal prefix to replace.
    pub prefix: String,
    /// Replacement text (possibly empty).
    pub target: String,
}

impl Remapping {
    /// Creates a remapping without a context.
    pub fn new(prefix: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            context: None,
            prefix: prefix.into(),
            target: target.into(),
        }
    }
}

impl FromStr for Remapping {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = REMAPPING
            .captures(s.trim())
            .ok_or_else(|| ConfigError::InvalidRemapping(s.to_string()))?;
        let prefix = caps
            .name("prefix")
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| ConfigError::InvalidRemapping(s.to_string()))?;
        Ok(Remapping {
            context: caps
                .name("context")
                .map(|m| m.as_str().to_string())
                .filter(|c| !c.is_empty()),
            prefix,
            target: caps
                .name("target")
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
        })
    }
}

impl fmt::Display for Remapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ctx) = &self.context {
            write!(f, "{ctx}:")?;
        }
        write!(f, "{}={}", self.prefix, self.target)
    }
}

impl Serialize for Remapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Remapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain() {
        let r: Remapping = "@openzeppelin/=node_modules/@openzeppelin/".parse().unwrap();
        assert_eq!(r.context, None);
        assert_eq!(r.prefix, "@openzeppelin/");
        assert_eq!(r.target, "node_modules/@openzeppelin/");
        assert_eq!(r.to_string(), "@openzeppelin/=node_modules/@openzeppelin/");
    }

    #[test]
    fn with_context() {
        let r: Remapping = "contracts/a.sol:https://github.com=github".parse().unwrap();
        assert_eq!(r.context.as_deref(), Some("contracts/a.sol"));
        assert_eq!(r.prefix, "https://github.com");
        assert_eq!(r.target, "github");
    }

    #[test]
    fn empty_context_is_global() {
        let r: Remapping = ":@OpenZeppelin=node_modules/openzeppelin".parse().unwrap();
        assert_eq!(r.context, None);
        assert_eq!(r.to_string(), "@OpenZeppelin=node_modules/openzeppelin");
    }

    #[test]
    fn empty_target() {
        let r: Remapping = "lib/=".parse().unwrap();
        assert_eq!(r.target, "");
    }

    #[test]
    fn invalid() {
        for bad in ["", "no-equals", "=target", "a b=c"] {
            assert!(bad.parse::<Remapping>().is_err(), "{bad:?} should fail");
        }
    }

    #[test]
    fn serde_from_string() {
        let r: Remapping = serde_json::from_str("\"ctx:a=b\"").unwrap();
        assert_eq!(r.context.as_deref(), Some("ctx"));
        assert_eq!(serde_json::to_string(&r).unwrap(), "\"ctx:a=b\"");
    }
}
