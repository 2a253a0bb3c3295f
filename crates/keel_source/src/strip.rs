//! Comment blanking for the pre-parser.

use crate::directive::{parse_directive, Directives};
use regex::bytes::Regex;
use std::sync::LazyLock;

static COMMENT_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m-u)(//.*$|/\*)").expect("comment pattern is valid"));
static COMMENT_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*/").expect("comment end pattern is valid"));

/// Returns `true` if every string literal opened in `line` is also closed.
///
/// Inside a literal a backslash escapes the byte after it, so a quote closes
/// the literal only after an even run of backslashes. The check is purely
/// per-line; Solidity string literals cannot span lines.
pub fn string_closed(line: &[u8]) -> bool {
    let mut open: Option<u8> = None;
    let mut escaped = false;
    for &b in line {
        match open {
            None if b == b'"' || b == b'\'' => open = Some(b),
            Some(_) if escaped => escaped = false,
            Some(_) if b == b'\\' => escaped = true,
            Some(q) if b == q => open = None,
            _ => {}
        }
    }
    open.is_none()
}

/// Offset of the first byte of the line containing `offset`.
pub(crate) fn line_start(source: &[u8], offset: usize) -> usize {
    source[..offset]
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |i| i + 1)
}

/// Returns `true` if `offset` is inside a string literal opened on its line.
pub(crate) fn inside_string(source: &[u8], offset: usize) -> bool {
    let start = line_start(source, offset);
    start < offset && !string_closed(&source[start..offset])
}

/// Replaces every comment in `source` with spaces and collects directives.
///
/// Newlines inside block comments are kept so that line numbers and byte
/// offsets of the remaining code are unchanged. Comment openers that appear
/// inside a string literal are left alone. An unterminated block comment
/// blanks everything up to the end of the input.
pub fn strip_comments(source: &mut [u8]) -> Directives {
    let mut directives = Directives::default();
    let mut search_start = 0;

    while search_start < source.len() {
        let Some((start, end)) = COMMENT_START
            .find_at(source, search_start)
            .map(|m| (m.start(), m.end()))
        else {
            break;
        };

        if inside_string(source, start) {
            search_start = start + 2;
            continue;
        }

        let comment_end = if &source[start..end] == b"/*" {
            match COMMENT_END.find_at(source, end) {
                Some(m) => m.end(),
                None => {
                    blank(&mut source[start..]);
                    break;
                }
            }
        } else {
            end
        };

        if let Some(directive) = parse_directive(&source[start..comment_end], start, comment_end) {
            directives.push(directive);
        }
        blank(&mut source[start..comment_end]);
        search_start = comment_end;
    }

    directives
}

fn blank(bytes: &mut [u8]) {
    for b in bytes.iter_mut().filter(|b| **b != b'\n') {
        *b = b' ';
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::DirectiveKind;

    fn strip(src: &str) -> (String, Directives) {
        let mut bytes = src.as_bytes().to_vec();
        let directives = strip_comments(&mut bytes);
        (String::from_utf8(bytes).unwrap(), directives)
    }

    #[test]
    fn string_closed_cases() {
        assert!(string_closed(b"uint a = 1;"));
        assert!(string_closed(b"string s = \"abc\";"));
        assert!(!string_closed(b"string s = \"abc"));
        assert!(!string_closed(b"string s = \"a\\\"bc"));
        assert!(string_closed(b"string s = 'it\"s';"));
        assert!(!string_closed(b"x = 'a"));
        assert!(string_closed(b"string s = \"\\\\\";"));
        assert!(!string_closed(b"string s = \"\\\\\\\";"));
    }

    #[test]
    fn escaped_backslash_closes_string() {
        let src = "string s = \"\\\\\"; // import \"./Gone.sol\";\nuint a;";
        let (out, _) = strip(src);
        assert!(!out.contains("import"), "{out}");
        assert!(out.contains("uint a;"));
        assert_eq!(out.len(), src.len());
    }

    #[test]
    fn line_comment_blanked_in_place() {
        let src = "uint a; // note\nuint b;";
        let (out, _) = strip(src);
        assert_eq!(out, format!("uint a; {}\nuint b;", " ".repeat(7)));
        assert_eq!(out.len(), src.len());
    }

    #[test]
    fn block_comment_keeps_newlines() {
        let (out, _) = strip("a /* x\ny */ b");
        assert_eq!(out, "a     \n     b");
    }

    #[test]
    fn unterminated_block_runs_to_eof() {
        let (out, _) = strip("a /* never closed\nimport \"x.sol\";");
        assert!(!out.contains("import"));
        assert!(out.starts_with("a "));
        assert_eq!(out.matches('\n').count(), 1);
    }

    #[test]
    fn comment_markers_in_strings_ignored() {
        let src = "string s = \"http://example.com\"; // real";
        let (out, _) = strip(src);
        assert!(out.contains("\"http://example.com\";"));
        assert!(!out.contains("real"));
    }

    #[test]
    fn block_opener_in_string_ignored() {
        let (out, _) = strip("string s = \"/*\"; uint a;");
        assert_eq!(out, "string s = \"/*\"; uint a;");
    }

    #[test]
    fn directives_recorded_with_spans() {
        let src = "uint a;\n// keel-disable-next-line foo\nuint b; /* keel-disable-line */\n";
        let (_, ds) = strip(src);
        assert_eq!(ds.len(), 2);
        let first = ds.iter().next().unwrap();
        assert_eq!(first.kind, DirectiveKind::DisableNextLine);
        assert_eq!(&src[first.start..first.end], "// keel-disable-next-line foo");
        let second = ds.iter().nth(1).unwrap();
        assert_eq!(second.kind, DirectiveKind::DisableLine);
        assert_eq!(&src[second.start..second.end], "/* keel-disable-line */");
    }

    #[test]
    fn empty_input() {
        let (out, ds) = strip("");
        assert!(out.is_empty());
        assert!(ds.is_empty());
    }
}
