//! Source file representation with line-start indexing for fast line lookup.

use keel_common::ContentHash;
use std::path::PathBuf;

/// A Solidity source file loaded into a build.
///
/// Stores the file's content along with precomputed line-start offsets so
/// diagnostic byte offsets can be mapped to lines for suppression and
/// rendering.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// The filesystem path of this file (or a synthetic path for overrides).
    pub path: PathBuf,
    /// The full text content of the file.
    pub content: String,
    /// Byte offsets of each line start (the first entry is always 0).
    line_starts: Vec<u32>,
    /// Hash of the file content.
    pub content_hash: ContentHash,
}

impl SourceFile {
    /// Creates a new `SourceFile` with precomputed line starts and content hash.
    pub fn new(path: PathBuf, content: String) -> Self {
        let line_starts = compute_line_starts(&content);
        let content_hash = ContentHash::from_bytes(content.as_bytes());
        Self {
            path,
            content,
            line_starts,
            content_hash,
        }
    }

    /// Returns the 0-based line containing `byte_offset`.
    ///
    /// Offsets past the end map to the last line.
    pub fn line_of(&self, byte_offset: u32) -> usize {
        match self.line_starts.binary_search(&byte_offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        }
    }

    /// Converts a byte offset into 1-indexed (line, column) coordinates.
    pub fn line_col(&self, byte_offset: u32) -> (u32, u32) {
        let line_idx = self.line_of(byte_offset);
        let col = byte_offset - self.line_starts[line_idx] + 1;
        ((line_idx as u32) + 1, col)
    }

    /// Returns the text of the 0-based line `idx`, without its newline.
    pub fn line_text(&self, idx: usize) -> Option<&str> {
        let start = *self.line_starts.get(idx)? as usize;
        let end = self
            .line_starts
            .get(idx + 1)
            .map_or(self.content.len(), |&e| e as usize);
        Some(self.content[start..end].trim_end_matches(['\n', '\r']))
    }

    /// Returns the number of lines.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

fn compute_line_starts(content: &str) -> Vec<u32> {
    let mut starts = vec![0u32];
    for (i, byte) in content.bytes().enumerate() {
        if byte == b'\n' {
            starts.push((i + 1) as u32);
        }
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_file(content: &str) -> SourceFile {
        SourceFile::new(PathBuf::from("Token.sol"), content.to_string())
    }

    #[test]
    fn line_starts_computation() {
        let f = make_file("abc\ndef\nghi");
        assert_eq!(f.line_starts, vec![0, 4, 8]);
        assert_eq!(f.line_count(), 3);
    }

    #[test]
    fn line_of_offsets() {
        let f = make_file("abc\ndef\nghi");
        assert_eq!(f.line_of(0), 0);
        assert_eq!(f.line_of(3), 0);
        assert_eq!(f.line_of(4), 1);
        assert_eq!(f.line_of(10), 2);
        assert_eq!(f.line_of(100), 2);
    }

    #[test]
    fn line_col_resolution() {
        let f = make_file("abc\ndef\nghi");
        assert_eq!(f.line_col(0), (1, 1));
        assert_eq!(f.line_col(5), (2, 2));
        assert_eq!(f.line_col(8), (3, 1));
    }

    #[test]
    fn line_text_strips_newline() {
        let f = make_file("first\r\nsecond\n");
        assert_eq!(f.line_text(0), Some("first"));
        assert_eq!(f.line_text(1), Some("second"));
        assert_eq!(f.line_text(2), Some(""));
        assert_eq!(f.line_text(3), None);
    }

    #[test]
    fn content_hash_computed() {
        let f = make_file("contract C {}");
        assert_eq!(f.content_hash, ContentHash::from_bytes(b"contract C {}"));
    }
}
