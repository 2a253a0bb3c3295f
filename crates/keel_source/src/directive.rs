//! `keel-*` directive comments that control diagnostic suppression.

use regex::bytes::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// The kind of a directive comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DirectiveKind {
    /// `keel-disable-next-line`: suppress on the line after the comment.
    DisableNextLine,
    /// `keel-disable-line`: suppress on the comment's own line(s).
    DisableLine,
    /// `keel-disable`: suppress until the next `keel-enable`.
    Disable,
    /// `keel-enable`: end a `keel-disable` region.
    Enable,
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DirectiveKind::DisableNextLine => "keel-disable-next-line",
            DirectiveKind::DisableLine => "keel-disable-line",
            DirectiveKind::Disable => "keel-disable",
            DirectiveKind::Enable => "keel-enable",
        };
        f.write_str(s)
    }
}

/// A directive comment found in a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    /// What the directive does.
    pub kind: DirectiveKind,
    /// Diagnostic codes the directive applies to; empty means all codes.
    pub codes: Vec<String>,
    /// Byte offset where the comment starts.
    pub start: usize,
    /// Byte offset just past the end of the comment.
    pub end: usize,
}

/// All directive comments of one file, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Directives {
    items: Vec<Directive>,
}

impl Directives {
    /// Appends a directive.
    pub fn push(&mut self, directive: Directive) {
        self.items.push(directive);
    }

    /// Iterates over all directives in source order.
    pub fn iter(&self) -> impl Iterator<Item = &Directive> {
        self.items.iter()
    }

    /// Iterates over the directives of one kind in source order.
    pub fn of_kind(&self, kind: DirectiveKind) -> impl Iterator<Item = &Directive> {
        self.items.iter().filter(move |d| d.kind == kind)
    }

    /// Returns the number of directives.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the file has no directives.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

const CODES: &str = r"([a-zA-Z0-9_-]*(?:\s*,\s*[a-zA-Z0-9_-]+)*)";

fn directive_re(keyword: &str) -> Regex {
    let pattern = format!(r"^\s*{keyword}\s*{CODES}");
    Regex::new(&pattern).expect("directive pattern is valid")
}

static DIRECTIVES: LazyLock<[(DirectiveKind, Regex); 4]> = LazyLock::new(|| {
    [
        (
            DirectiveKind::DisableNextLine,
            directive_re("keel-disable-next-line"),
        ),
        (DirectiveKind::DisableLine, directive_re("keel-disable-line")),
        (DirectiveKind::Disable, directive_re(r"keel-disable(?:\s|$)")),
        (DirectiveKind::Enable, directive_re("keel-enable")),
    ]
});

/// Parses a full comment (including its `//` or `/*` opener) as a directive.
///
/// Returns `None` for ordinary comments.
pub(crate) fn parse_directive(comment: &[u8], start: usize, end: usize) -> Option<Directive> {
    let body = comment.get(2..)?;
    DIRECTIVES.iter().find_map(|(kind, re)| {
        let caps = re.captures(body)?;
        let codes = caps
            .get(1)
            .map(|m| {
                String::from_utf8_lossy(m.as_bytes())
                    .split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Some(Directive {
            kind: *kind,
            codes,
            start,
            end,
        })
    })
}
