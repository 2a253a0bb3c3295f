//! Extraction of version pragmas and imports from stripped source text.

use crate::directive::Directives;
use crate::error::PreParseError;
use crate::import::parse_import_clause;
use crate::strip::{inside_string, strip_comments};
use keel_common::{ContentHash, VersionRanges};
use regex::bytes::Regex;
use std::sync::LazyLock;

static PRAGMA_SOLIDITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bpragma\s+solidity\s+(?P<version>[^;]+)\s*;").expect("pragma pattern is valid")
});
static IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bimport\s*(?P<import>[\s"'*{][^;]+)\s*;"#).expect("import pattern is valid")
});

/// How malformed pragmas and imports are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// The first malformed pragma or import is an error.
    Strict,
    /// Malformed pragmas and imports are skipped.
    #[default]
    Lenient,
}

/// The pre-parse summary of one source file.
#[derive(Debug, Clone)]
pub struct PreParsed {
    /// Intersection of all `pragma solidity` constraints (`>=0.0.0` if none).
    pub versions: VersionRanges,
    /// Import path literals, deduplicated, in order of first appearance.
    pub imports: Vec<String>,
    /// Hash of the raw bytes.
    pub content_hash: ContentHash,
    /// Directive comments found while stripping.
    pub directives: Directives,
}

/// Pre-parses raw Solidity source bytes.
pub fn preparse(content: &[u8], mode: ParseMode) -> Result<PreParsed, PreParseError> {
    let content_hash = ContentHash::from_bytes(content);
    let mut stripped = content.to_vec();
    let directives = strip_comments(&mut stripped);

    Ok(PreParsed {
        versions: version_pragmas(&stripped, mode)?,
        imports: imports(&stripped, mode)?,
        content_hash,
        directives,
    })
}

fn utf8(bytes: &[u8], base: usize) -> Result<&str, PreParseError> {
    std::str::from_utf8(bytes).map_err(|e| PreParseError::InvalidUtf8 {
        offset: base + e.valid_up_to(),
    })
}

fn version_pragmas(source: &[u8], mode: ParseMode) -> Result<VersionRanges, PreParseError> {
    let mut versions: Option<VersionRanges> = None;
    for caps in PRAGMA_SOLIDITY.captures_iter(source) {
        let Some(whole) = caps.get(0) else { continue };
        if inside_string(source, whole.start()) {
            continue;
        }
        let Some(m) = caps.name("version") else { continue };
        let expression = utf8(m.as_bytes(), m.start())?.trim();
        let parsed = match expression.parse::<VersionRanges>() {
            Ok(parsed) => parsed,
            Err(source) if mode == ParseMode::Strict => {
                return Err(PreParseError::InvalidPragma {
                    expression: expression.to_string(),
                    source,
                });
            }
            Err(e) => {
                tracing::debug!("skipping malformed pragma: {e}");
                continue;
            }
        };
        versions = Some(match versions {
            Some(prev) => prev.intersect(&parsed),
            None => parsed,
        });
    }
    Ok(versions.unwrap_or_else(VersionRanges::any))
}

fn imports(source: &[u8], mode: ParseMode) -> Result<Vec<String>, PreParseError> {
    let mut out: Vec<String> = Vec::new();
    for caps in IMPORT.captures_iter(source) {
        let Some(whole) = caps.get(0) else { continue };
        if inside_string(source, whole.start()) {
            continue;
        }
        let Some(m) = caps.name("import") else { continue };
        let clause = utf8(m.as_bytes(), m.start())?;
        match parse_import_clause(clause) {
            Ok(path) => {
                if !out.contains(&path) {
                    out.push(path);
                }
            }
            Err(reason) if mode == ParseMode::Strict => {
                return Err(PreParseError::InvalidImport {
                    clause: clause.trim().to_string(),
                    reason,
                });
            }
            Err(reason) => tracing::debug!("skipping malformed import '{}': {reason}", clause.trim()),
        }
    }
    Ok(out)
}
