//! Compiler diagnostics, directive-based suppression, and rendering.
//!
//! This crate provides the [`Diagnostic`] model that compiler messages are
//! converted into, the thread-safe [`DiagnosticSink`] used while units compile
//! in parallel, the [`SuppressionTable`] that applies `keel-*` directive
//! comments, and [`DiagnosticRenderer`] implementations for terminal and JSON
//! output.

#![warn(missing_docs)]

pub mod diagnostic;
pub mod location;
pub mod renderer;
pub mod severity;
pub mod sink;
pub mod suppression;

pub use diagnostic::Diagnostic;
pub use location::SourceLocation;
pub use renderer::{DiagnosticRenderer, JsonRenderer, SourceLookup, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
pub use suppression::SuppressionTable;
