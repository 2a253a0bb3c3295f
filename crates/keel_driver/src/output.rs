//! The standard JSON output document.

use keel_diagnostics::{Diagnostic, Severity, SourceLocation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A standard JSON output document.
///
/// Contract outputs are kept as raw JSON; the build only inspects errors and
/// the per-file AST.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolcOutput {
    /// Errors, warnings, and infos.
    #[serde(default)]
    pub errors: Vec<SolcError>,
    /// Per-file outputs, keyed by source unit name.
    #[serde(default)]
    pub sources: BTreeMap<String, SourceOutput>,
    /// Per-contract outputs: file name to contract name to outputs.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub contracts: Value,
}

impl SolcOutput {
    /// Returns `true` if any reported error has error severity.
    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(|e| e.severity.is_error())
    }
}

/// Per-file output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceOutput {
    /// The compiler-assigned source id.
    pub id: u32,
    /// The file's AST, if requested.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub ast: Value,
}

/// One entry of the `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolcError {
    /// Where the error was detected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_location: Option<ErrorSourceLocation>,
    /// Related locations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secondary_source_locations: Vec<SecondarySourceLocation>,
    /// Error type, e.g. `TypeError`.
    #[serde(rename = "type")]
    pub kind: String,
    /// The compiler component that reported it.
    #[serde(default)]
    pub component: String,
    /// `error`, `warning`, or `info`.
    pub severity: Severity,
    /// Numeric error code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// The message.
    pub message: String,
    /// The compiler's rendering with source context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_message: Option<String>,
}

/// A byte range reported by the compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSourceLocation {
    /// Source unit name.
    pub file: String,
    /// Start offset, `-1` when unknown.
    pub start: i64,
    /// End offset, `-1` when unknown.
    pub end: i64,
}

impl ErrorSourceLocation {
    fn to_location(&self) -> Option<SourceLocation> {
        let start = u32::try_from(self.start).ok()?;
        let end = u32::try_from(self.end).ok()?;
        Some(SourceLocation::new(self.file.clone(), start, end))
    }
}

/// A secondary location with its own message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondarySourceLocation {
    /// Source unit name.
    pub file: String,
    /// Start offset.
    pub start: i64,
    /// End offset.
    pub end: i64,
    /// What this location refers to.
    #[serde(default)]
    pub message: String,
}

impl From<&SolcError> for Diagnostic {
    fn from(error: &SolcError) -> Self {
        let base = match error.severity {
            Severity::Error => Diagnostic::error(error.message.clone()),
            Severity::Warning => Diagnostic::warning(error.message.clone()),
            Severity::Info => Diagnostic::info(error.message.clone()),
        };
        let mut diagnostic = base.with_kind(error.kind.clone());
        if let Some(code) = &error.error_code {
            diagnostic = diagnostic.with_code(code.clone());
        }
        if let Some(location) = error.source_location.as_ref().and_then(|l| l.to_location()) {
            diagnostic = diagnostic.with_location(location);
        }
        if let Some(formatted) = &error.formatted_message {
            diagnostic = diagnostic.with_formatted(formatted.clone());
        }
        for secondary in &error.secondary_source_locations {
            diagnostic = diagnostic.with_note(format!(
                "{}:{}..{}: {}",
                secondary.file, secondary.start, secondary.end, secondary.message
            ));
        }
        diagnostic
    }
}
