//! Source files and the lightweight Solidity pre-parser.
//!
//! The pre-parser extracts just enough from a Solidity file to plan a build
//! without running the compiler: the `pragma solidity` version constraints,
//! the import targets, a content hash, and `keel-*` directive comments that
//! suppress diagnostics. Comments are blanked out beforehand so that commented
//! pragmas and imports are ignored while byte offsets stay intact.

#![warn(missing_docs)]

pub mod directive;
pub mod error;
pub mod import;
pub mod preparse;
pub mod source_file;
pub mod strip;

pub use directive::{Directive, DirectiveKind, Directives};
pub use error::PreParseError;
pub use import::parse_import_clause;
pub use preparse::{preparse, ParseMode, PreParsed};
pub use source_file::SourceFile;
pub use strip::strip_comments;
