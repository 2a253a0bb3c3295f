//! Diagnostic rendering backends for human-readable and machine-readable output.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use keel_source::SourceFile;
use std::collections::{BTreeMap, HashMap};

/// Maps source unit names to loaded source files.
pub trait SourceLookup {
    /// Returns the file for `source_unit`, if it is known.
    fn lookup(&self, source_unit: &str) -> Option<&SourceFile>;
}

impl SourceLookup for HashMap<String, SourceFile> {
    fn lookup(&self, source_unit: &str) -> Option<&SourceFile> {
        self.get(source_unit)
    }
}

impl SourceLookup for BTreeMap<String, SourceFile> {
    fn lookup(&self, source_unit: &str) -> Option<&SourceFile> {
        self.get(source_unit)
    }
}

/// Trait for rendering diagnostics into formatted output strings.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic into a formatted string.
    fn render(&self, diag: &Diagnostic, sources: &dyn SourceLookup) -> String;
}

/// Renders diagnostics in a rustc-style terminal format.
///
/// Produces output like:
/// ```text
/// warning[2072]: Unused local variable.
///   --> contracts/Token.sol:10:9
///    |
/// 10 |         uint256 x = 1;
///    |         ^^^^^^^^^
///    = note: ...
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn severity(&self, severity: Severity) -> String {
        if !self.color {
            return severity.to_string();
        }
        let code = match severity {
            Severity::Error => "31",
            Severity::Warning => "33",
            Severity::Info => "36",
        };
        format!("\x1b[1;{code}m{severity}\x1b[0m")
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic, sources: &dyn SourceLookup) -> String {
        let mut out = String::new();

        let severity = self.severity(diag.severity);
        match &diag.code {
            Some(code) => out.push_str(&format!("{severity}[{code}]: {}\n", diag.message)),
            None => out.push_str(&format!("{severity}: {}\n", diag.message)),
        }

        if let Some(loc) = &diag.location {
            match sources.lookup(&loc.source_unit) {
                Some(file) if (loc.start as usize) <= file.content.len() => {
                    let (line, col) = file.line_col(loc.start);
                    out.push_str(&format!("  --> {}:{line}:{col}\n", loc.source_unit));

                    let line_num = line.to_string();
                    let padding = " ".repeat(line_num.len());
                    let text = file.line_text((line - 1) as usize).unwrap_or_default();
                    let width = (loc.end.saturating_sub(loc.start) as usize)
                        .clamp(1, text.len().saturating_sub(col as usize - 1).max(1));
                    out.push_str(&format!("{padding} |\n"));
                    out.push_str(&format!("{line_num} | {text}\n"));
                    out.push_str(&format!(
                        "{padding} | {}{}\n",
                        " ".repeat(col as usize - 1),
                        "^".repeat(width)
                    ));
                }
                _ => out.push_str(&format!("  --> {}\n", loc.source_unit)),
            }
        }

        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }

        out
    }
}

/// Renders each diagnostic as one line of JSON.
pub struct JsonRenderer;

impl DiagnosticRenderer for JsonRenderer {
    fn render(&self, diag: &Diagnostic, _sources: &dyn SourceLookup) -> String {
        serde_json::to_string(diag).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
    }
}
