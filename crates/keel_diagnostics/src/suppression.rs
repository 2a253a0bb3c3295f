//! Suppression of non-error diagnostics through `keel-*` directive comments.
//!
//! Lines are 0-based. A directive's line is the line on which its comment
//! ends.
//!
//! - `keel-disable-line` suppresses diagnostics whose line range contains the
//!   directive line.
//! - `keel-disable-next-line` suppresses diagnostics whose line range contains
//!   the line after the directive.
//! - `keel-disable` suppresses from its line until a matching `keel-enable`
//!   (or the end of the file).
//!
//! A directive without codes applies to every code.

use crate::diagnostic::Diagnostic;
use keel_source::{DirectiveKind, Directives, SourceFile};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone)]
struct Entry {
    codes: Vec<String>,
    start_line: usize,
}

impl Entry {
    fn matches(&self, code: Option<&str>) -> bool {
        self.codes.is_empty() || code.is_some_and(|c| self.codes.iter().any(|x| x == c))
    }
}

/// Per-file lookup table built from directive comments.
#[derive(Debug, Clone, Default)]
pub struct SuppressionTable {
    /// Keyed by directive end line.
    by_kind: BTreeMap<DirectiveKind, BTreeMap<usize, Vec<Entry>>>,
}

impl SuppressionTable {
    /// Indexes `directives` using the line table of `source`.
    pub fn new(directives: &Directives, source: &SourceFile) -> Self {
        let mut by_kind: BTreeMap<DirectiveKind, BTreeMap<usize, Vec<Entry>>> = BTreeMap::new();
        for d in directives.iter() {
            let start_line = source.line_of(d.start as u32);
            let end_line = source.line_of(d.end.saturating_sub(1).max(d.start) as u32);
            by_kind
                .entry(d.kind)
                .or_default()
                .entry(end_line)
                .or_default()
                .push(Entry {
                    codes: d.codes.clone(),
                    start_line,
                });
        }
        Self { by_kind }
    }

    /// Returns `true` if there are no directives.
    pub fn is_empty(&self) -> bool {
        self.by_kind.is_empty()
    }

    fn at(&self, kind: DirectiveKind, line: usize, code: Option<&str>) -> bool {
        self.by_kind
            .get(&kind)
            .and_then(|lines| lines.get(&line))
            .is_some_and(|entries| entries.iter().any(|e| e.matches(code)))
    }

    /// Walks `keel-disable`/`keel-enable` up to `line` and reports whether
    /// `code` is inside a disabled region there.
    fn in_disabled_region(&self, line: usize, code: Option<&str>) -> bool {
        let mut events: Vec<(usize, DirectiveKind, &Entry)> = Vec::new();
        for kind in [DirectiveKind::Disable, DirectiveKind::Enable] {
            if let Some(lines) = self.by_kind.get(&kind) {
                for (&end_line, entries) in lines.range(..=line) {
                    events.extend(entries.iter().map(|e| (end_line, kind, e)));
                }
            }
        }
        events.sort_by_key(|(end_line, _, e)| (*end_line, e.start_line));

        let mut all = false;
        let mut codes: BTreeSet<&str> = BTreeSet::new();
        for (_, kind, entry) in events {
            match (kind, entry.codes.is_empty()) {
                (DirectiveKind::Disable, true) => all = true,
                (DirectiveKind::Disable, false) => {
                    codes.extend(entry.codes.iter().map(String::as_str));
                }
                (_, true) => {
                    all = false;
                    codes.clear();
                }
                (_, false) => {
                    for c in &entry.codes {
                        codes.remove(c.as_str());
                    }
                }
            }
        }
        all || code.is_some_and(|c| codes.contains(c))
    }

    /// Returns `true` if a diagnostic with `code` spanning lines
    /// `start_line..=end_line` is suppressed.
    pub fn is_suppressed(&self, code: Option<&str>, start_line: usize, end_line: usize) -> bool {
        (start_line..=end_line).any(|line| {
            self.at(DirectiveKind::DisableLine, line, code)
                || (line > 0 && self.at(DirectiveKind::DisableNextLine, line - 1, code))
        }) || self.in_disabled_region(start_line, code)
    }

    /// Returns `true` if `diag` should be kept. Errors are never suppressed,
    /// nor are diagnostics without a location.
    pub fn allows(&self, diag: &Diagnostic, source: &SourceFile) -> bool {
        if diag.severity.is_error() || self.is_empty() {
            return true;
        }
        let Some(loc) = &diag.location else {
            return true;
        };
        let start_line = source.line_of(loc.start);
        let end_line = source.line_of(loc.end.saturating_sub(1).max(loc.start));
        !self.is_suppressed(diag.code.as_deref(), start_line, end_line)
    }

    /// Removes suppressed diagnostics from `diags`.
    pub fn filter(&self, diags: Vec<Diagnostic>, source: &SourceFile) -> Vec<Diagnostic> {
        diags.into_iter().filter(|d| self.allows(d, source)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::SourceLocation;
    use keel_source::{preparse, ParseMode};
    use std::path::PathBuf;

    fn table(src: &str) -> (SuppressionTable, SourceFile) {
        let parsed = preparse(src.as_bytes(), ParseMode::Lenient).unwrap();
        let file = SourceFile::new(PathBuf::from("A.sol"), src.to_string());
        (SuppressionTable::new(&parsed.directives, &file), file)
    }

    fn warning_on_line(file: &SourceFile, line: usize, code: &str) -> Diagnostic {
        let start = file
            .content
            .split_inclusive('\n')
            .take(line)
            .map(str::len)
            .sum::<usize>() as u32;
        Diagnostic::warning("w")
            .with_code(code)
            .with_location(SourceLocation::new("A.sol", start, start + 1))
    }

    #[test]
    fn disable_next_line() {
        let (t, _) = table("// keel-disable-next-line 2072\nuint a;\nuint b;\n");
        assert!(t.is_suppressed(Some("2072"), 1, 1));
        assert!(!t.is_suppressed(Some("2072"), 2, 2));
        assert!(!t.is_suppressed(Some("9999"), 1, 1));
    }

    #[test]
    fn disable_line_without_codes_matches_all() {
        let (t, _) = table("uint a; // keel-disable-line\nuint b;\n");
        assert!(t.is_suppressed(Some("1"), 0, 0));
        assert!(t.is_suppressed(None, 0, 0));
        assert!(!t.is_suppressed(Some("1"), 1, 1));
    }

    #[test]
    fn multi_line_diagnostic_hits_directive() {
        let (t, _) = table("a\nb\nc; // keel-disable-line\n");
        assert!(t.is_suppressed(Some("x"), 0, 2));
        assert!(!t.is_suppressed(Some("x"), 0, 1));
    }

    #[test]
    fn disable_enable_region() {
        let src = "a\n// keel-disable 2072\nb\nc\n// keel-enable 2072\nd\n";
        let (t, _) = table(src);
        assert!(!t.is_suppressed(Some("2072"), 0, 0));
        assert!(t.is_suppressed(Some("2072"), 2, 2));
        assert!(t.is_suppressed(Some("2072"), 3, 3));
        assert!(!t.is_suppressed(Some("2072"), 5, 5));
        assert!(!t.is_suppressed(Some("1111"), 2, 2));
    }

    #[test]
    fn disable_all_runs_to_eof() {
        let (t, _) = table("a\n/* keel-disable */\nb\nc\n");
        assert!(t.is_suppressed(Some("1"), 3, 3));
        assert!(t.is_suppressed(None, 2, 2));
    }

    #[test]
    fn errors_never_suppressed() {
        let (t, file) = table("uint a; // keel-disable-line\n");
        let err = Diagnostic::error("e").with_location(SourceLocation::new("A.sol", 0, 4));
        let warn = Diagnostic::warning("w").with_location(SourceLocation::new("A.sol", 0, 4));
        assert!(t.allows(&err, &file));
        assert!(!t.allows(&warn, &file));
    }

    #[test]
    fn filter_keeps_unlocated_and_unmatched() {
        let src = "// keel-disable-next-line 2072\nuint a;\nuint b;\n";
        let (t, file) = table(src);
        let diags = vec![
            warning_on_line(&file, 1, "2072"),
            warning_on_line(&file, 2, "2072"),
            Diagnostic::warning("global"),
        ];
        let line_two = warning_on_line(&file, 2, "2072");
        let kept = t.filter(diags, &file);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0], line_two);
        assert!(kept[1].location.is_none());
    }
}
