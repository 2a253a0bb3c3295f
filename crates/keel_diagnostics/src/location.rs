//! Source locations expressed in source unit names and byte offsets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A byte range within a source unit, as reported by the compiler.
///
/// `start` is inclusive and `end` exclusive.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    /// The source unit name the range belongs to.
    pub source_unit: String,
    /// Byte offset of the first byte.
    pub start: u32,
    /// Byte offset just past the last byte.
    pub end: u32,
}

impl SourceLocation {
    /// Creates a location.
    pub fn new(source_unit: impl Into<String>, start: u32, end: u32) -> Self {
        Self {
            source_unit: source_unit.into(),
            start,
            end,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}..{}", self.source_unit, self.start, self.end)
    }
}
