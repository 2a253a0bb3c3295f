//! The standard JSON input document.

use crate::evm::adjust_settings;
use keel_common::SemanticVersion;
use keel_config::{BytecodeHash, EvmVersion, SolcConfig};
use keel_graph::{CompilationUnit, ImportGraph, Overrides};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// File name to contract name (`""` for file-level outputs) to output names.
pub type OutputSelection = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// First release that reads sources through `--base-path` and
/// `--include-path`.
const URLS_SINCE: SemanticVersion = SemanticVersion::new(0, 8, 8);

/// A standard JSON input document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolcInput {
    /// Always `Solidity`.
    pub language: String,
    /// Source unit name to source.
    pub sources: BTreeMap<String, SourceInput>,
    /// Compiler settings.
    pub settings: SolcSettings,
}

/// One entry of [`SolcInput::sources`]: either URLs the compiler reads
/// itself or inline content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInput {
    /// URLs resolved by the compiler's file reader.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,
    /// Inline source text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl SourceInput {
    /// A source read by the compiler from `url`.
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            urls: Some(vec![url.into()]),
            content: None,
        }
    }

    /// A source passed inline.
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            urls: None,
            content: Some(content.into()),
        }
    }
}

/// The `settings` object of the input document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolcSettings {
    /// Remappings in `[context:]prefix=target` form.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remappings: Vec<String>,
    /// Optimizer settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimizer: Option<OptimizerSettings>,
    /// Target EVM version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evm_version: Option<EvmVersion>,
    /// Compile through the IR pipeline.
    #[serde(default, rename = "viaIR", skip_serializing_if = "Option::is_none")]
    pub via_ir: Option<bool>,
    /// Metadata settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataSettings>,
    /// Requested outputs.
    #[serde(default)]
    pub output_selection: OutputSelection,
}

/// The `settings.optimizer` object.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OptimizerSettings {
    /// Whether the optimizer runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Expected number of contract executions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runs: Option<u32>,
}

/// The `settings.metadata` object.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataSettings {
    /// Append CBOR metadata to the bytecode (0.8.18 and later).
    #[serde(default, rename = "appendCBOR", skip_serializing_if = "Option::is_none")]
    pub append_cbor: Option<bool>,
    /// Embed source content instead of URLs in the metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_literal_content: Option<bool>,
    /// Metadata hash method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytecode_hash: Option<BytecodeHash>,
}

impl MetadataSettings {
    fn is_empty(&self) -> bool {
        self.append_cbor.is_none() && self.use_literal_content.is_none() && self.bytecode_hash.is_none()
    }
}

impl SolcSettings {
    /// Settings derived from the `[compiler.solc]` table, requesting every
    /// per-contract output and the AST of every file.
    pub fn from_config(config: &SolcConfig) -> Self {
        let metadata = MetadataSettings {
            append_cbor: config.metadata.append_cbor,
            use_literal_content: config.metadata.use_literal_content,
            bytecode_hash: config.metadata.bytecode_hash,
        };
        Self {
            remappings: config.remappings.iter().map(ToString::to_string).collect(),
            optimizer: Some(OptimizerSettings {
                enabled: config.optimizer.enabled,
                runs: Some(config.optimizer.runs),
            }),
            evm_version: config.evm_version,
            via_ir: config.via_ir,
            metadata: (!metadata.is_empty()).then_some(metadata),
            output_selection: default_output_selection(),
        }
    }
}

/// `{"*": {"": ["ast"], "*": ["*"]}}`
pub fn default_output_selection() -> OutputSelection {
    let per_file = BTreeMap::from([
        (String::new(), vec!["ast".to_string()]),
        ("*".to_string(), vec!["*".to_string()]),
    ]);
    BTreeMap::from([("*".to_string(), per_file)])
}

/// Restricts per-contract outputs to `modified` source units.
///
/// The wildcard file keeps its file-level selection (the AST), so unchanged
/// files are still analysed but not code-generated. Settings without a
/// wildcard contract selection are returned unchanged.
pub fn narrow_output_selection(settings: &SolcSettings, modified: &BTreeSet<String>) -> SolcSettings {
    let Some(all) = settings.output_selection.get("*") else {
        return settings.clone();
    };
    let Some(contracts) = all.get("*") else {
        return settings.clone();
    };
    let mut selection = OutputSelection::new();
    if let Some(file_level) = all.get("") {
        selection.insert(
            "*".to_string(),
            BTreeMap::from([(String::new(), file_level.clone())]),
        );
    }
    for name in modified {
        selection.insert(
            name.clone(),
            BTreeMap::from([("*".to_string(), contracts.clone())]),
        );
    }
    SolcSettings {
        output_selection: selection,
        ..settings.clone()
    }
}

/// Builds the input document compiling `unit` with `version`.
///
/// From 0.8.8 on, sources are passed as their source unit names and read by
/// the compiler through the include paths; older releases, and files with an
/// in-memory override, get their content inline.
pub fn build_input(
    unit: &CompilationUnit,
    version: &SemanticVersion,
    settings: &SolcSettings,
    overrides: &Overrides,
    graph: &ImportGraph,
) -> SolcInput {
    let mut sources = BTreeMap::new();
    for node in unit.names.iter().filter_map(|name| graph.get(name)) {
        let source = if *version < URLS_SINCE || overrides.contains_key(&node.path) {
            SourceInput::content(node.source.content.clone())
        } else {
            SourceInput::url(node.name.clone())
        };
        sources.insert(node.name.clone(), source);
    }
    SolcInput {
        language: "Solidity".to_string(),
        sources,
        settings: adjust_settings(settings, version),
    }
}
