//! Configuration types deserialized from `keel.toml`.

use crate::remapping::Remapping;
use keel_common::SemanticVersion;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default lowest compiler version a build may select.
pub const DEFAULT_MIN_VERSION: SemanticVersion = SemanticVersion::new(0, 6, 2);
/// Default highest compiler version a build may select.
pub const DEFAULT_MAX_VERSION: SemanticVersion = SemanticVersion::new(0, 8, 30);

/// The top-level project configuration parsed from `keel.toml`.
///
/// Every section is optional; an empty file yields the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeelConfig {
    /// Compiler settings.
    #[serde(default)]
    pub compiler: CompilerConfig,
    /// Compiler version window.
    #[serde(default)]
    pub svm: SvmConfig,
    /// Build behaviour.
    #[serde(default)]
    pub build: BuildConfig,
}

/// The `[compiler]` table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompilerConfig {
    /// The `[compiler.solc]` table.
    #[serde(default)]
    pub solc: SolcConfig,
}

/// The `[compiler.solc]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolcConfig {
    /// Extra directories the compiler may read from.
    #[serde(default, deserialize_with = "deserialize_paths")]
    pub allow_paths: Vec<PathBuf>,
    /// Directories excluded from source discovery.
    #[serde(default, deserialize_with = "deserialize_paths")]
    pub exclude_paths: Vec<PathBuf>,
    /// Additional roots used to resolve non-relative imports.
    #[serde(default, deserialize_with = "deserialize_paths")]
    pub include_paths: Vec<PathBuf>,
    /// Import remappings, in priority order.
    #[serde(default)]
    pub remappings: Vec<Remapping>,
    /// A compiler version every unit must be compiled with.
    #[serde(default)]
    pub target_version: Option<SemanticVersion>,
    /// Requested EVM version, lowered per compiler version when unsupported.
    #[serde(default)]
    pub evm_version: Option<EvmVersion>,
    /// Whether to compile through the IR pipeline.
    #[serde(default, rename = "via_IR")]
    pub via_ir: Option<bool>,
    /// Optimizer settings.
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    /// Metadata settings.
    #[serde(default)]
    pub metadata: MetadataConfig,
}

/// The `[compiler.solc.optimizer]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Whether the optimizer runs; left to the compiler's default when unset.
    #[serde(default)]
    pub enabled: Option<bool>,
    /// Expected number of contract executions.
    #[serde(default = "default_runs")]
    pub runs: u32,
}

fn default_runs() -> u32 {
    200
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            enabled: None,
            runs: default_runs(),
        }
    }
}

/// The `[compiler.solc.metadata]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// Whether to append CBOR metadata to the bytecode.
    #[serde(default, rename = "append_CBOR")]
    pub append_cbor: Option<bool>,
    /// Whether to embed literal source content in the metadata.
    #[serde(default)]
    pub use_literal_content: Option<bool>,
    /// The hash method used for the metadata hash.
    #[serde(default)]
    pub bytecode_hash: Option<BytecodeHash>,
}

/// Metadata hash method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BytecodeHash {
    /// No hash.
    None,
    /// IPFS hash.
    Ipfs,
    /// Swarm hash.
    Bzzr1,
}

/// EVM hard forks, ordered from oldest to newest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EvmVersion {
    /// Homestead.
    Homestead,
    /// Tangerine Whistle.
    TangerineWhistle,
    /// Spurious Dragon.
    SpuriousDragon,
    /// Byzantium.
    Byzantium,
    /// Constantinople.
    Constantinople,
    /// Petersburg.
    Petersburg,
    /// Istanbul.
    Istanbul,
    /// Berlin.
    Berlin,
    /// London.
    London,
    /// Paris (the Merge).
    Paris,
    /// Shanghai.
    Shanghai,
    /// Cancun.
    Cancun,
    /// Prague.
    Prague,
    /// Osaka.
    Osaka,
}

impl EvmVersion {
    /// Every EVM version, oldest first.
    pub const ALL: [EvmVersion; 14] = [
        EvmVersion::Homestead,
        EvmVersion::TangerineWhistle,
        EvmVersion::SpuriousDragon,
        EvmVersion::Byzantium,
        EvmVersion::Constantinople,
        EvmVersion::Petersburg,
        EvmVersion::Istanbul,
        EvmVersion::Berlin,
        EvmVersion::London,
        EvmVersion::Paris,
        EvmVersion::Shanghai,
        EvmVersion::Cancun,
        EvmVersion::Prague,
        EvmVersion::Osaka,
    ];

    /// The name the compiler uses for this version.
    pub fn as_str(self) -> &'static str {
        match self {
            EvmVersion::Homestead => "homestead",
            EvmVersion::TangerineWhistle => "tangerineWhistle",
            EvmVersion::SpuriousDragon => "spuriousDragon",
            EvmVersion::Byzantium => "byzantium",
            EvmVersion::Constantinople => "constantinople",
            EvmVersion::Petersburg => "petersburg",
            EvmVersion::Istanbul => "istanbul",
            EvmVersion::Berlin => "berlin",
            EvmVersion::London => "london",
            EvmVersion::Paris => "paris",
            EvmVersion::Shanghai => "shanghai",
            EvmVersion::Cancun => "cancun",
            EvmVersion::Prague => "prague",
            EvmVersion::Osaka => "osaka",
        }
    }
}

impl fmt::Display for EvmVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvmVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EvmVersion::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown EVM version '{s}'"))
    }
}

/// The `[svm]` table: which compiler versions a build may select.
#[derive(Debug, Clone, Deserialize)]
pub struct SvmConfig {
    /// Lowest selectable compiler version.
    #[serde(default = "default_min_version")]
    pub min_version: SemanticVersion,
    /// Highest selectable compiler version.
    #[serde(default = "default_max_version")]
    pub max_version: SemanticVersion,
}

fn default_min_version() -> SemanticVersion {
    DEFAULT_MIN_VERSION
}

fn default_max_version() -> SemanticVersion {
    DEFAULT_MAX_VERSION
}

impl Default for SvmConfig {
    fn default() -> Self {
        Self {
            min_version: DEFAULT_MIN_VERSION,
            max_version: DEFAULT_MAX_VERSION,
        }
    }
}

/// The `[build]` table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildConfig {
    /// Keep one unit per sink instead of merging compatible units.
    /// Defaults to `true`.
    #[serde(default)]
    pub incremental: Option<bool>,
    /// Maximum number of concurrent compiler processes.
    #[serde(default)]
    pub jobs: Option<usize>,
}

impl BuildConfig {
    /// Returns the effective incremental flag.
    pub fn is_incremental(&self) -> bool {
        self.incremental.unwrap_or(true)
    }
}

/// Deserializes a field that can be either a single path or a list of paths.
fn deserialize_paths<'de, D>(deserializer: D) -> Result<Vec<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    struct PathOrVec;

    impl<'de> Visitor<'de> for PathOrVec {
        type Value = Vec<PathBuf>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a path or a list of paths")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![PathBuf::from(v)])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(PathBuf::from(val));
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(PathOrVec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evm_version_names() {
        assert_eq!(EvmVersion::TangerineWhistle.to_string(), "tangerineWhistle");
        assert_eq!("cancun".parse::<EvmVersion>().unwrap(), EvmVersion::Cancun);
        assert_eq!(
            "SpuriousDragon".parse::<EvmVersion>().unwrap(),
            EvmVersion::SpuriousDragon
        );
        assert!("frontier".parse::<EvmVersion>().is_err());
    }

    #[test]
    fn evm_version_ordering() {
        assert!(EvmVersion::London < EvmVersion::Paris);
        assert!(EvmVersion::Osaka > EvmVersion::Prague);
        let mut sorted = EvmVersion::ALL;
        sorted.sort();
        assert_eq!(sorted, EvmVersion::ALL);
    }

    #[test]
    fn evm_version_serde_matches_display() {
        for v in EvmVersion::ALL {
            let json = serde_json::to_string(&v).unwrap();
            assert_eq!(json, format!("\"{v}\""));
        }
    }

    #[test]
    fn paths_single_string() {
        let cfg: SolcConfig = toml::from_str(r#"include_paths = "node_modules""#).unwrap();
        assert_eq!(cfg.include_paths, vec![PathBuf::from("node_modules")]);
    }

    #[test]
    fn paths_list() {
        let cfg: SolcConfig = toml::from_str(r#"allow_paths = ["lib", "vendor"]"#).unwrap();
        assert_eq!(cfg.allow_paths.len(), 2);
    }

    #[test]
    fn defaults() {
        let cfg = KeelConfig::default();
        assert_eq!(cfg.svm.min_version, DEFAULT_MIN_VERSION);
        assert_eq!(cfg.svm.max_version, DEFAULT_MAX_VERSION);
        assert_eq!(cfg.compiler.solc.optimizer.runs, 200);
        assert!(cfg.build.is_incremental());
        assert!(cfg.compiler.solc.remappings.is_empty());
    }
}
