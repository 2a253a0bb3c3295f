//! Build coordination: from a set of Solidity files to compiler outputs.
//!
//! A [`BuildContext`] carries everything one project session needs (the
//! configuration, the name resolver, the compiler version provider, and the
//! install and concurrency bookkeeping). [`Compiler::compile`] runs one build
//! on it: graph, partition, incremental selection, version selection,
//! installs, parallel compiler runs, and the cache write.

#![warn(missing_docs)]

pub mod compiler;
pub mod context;
pub mod error;
pub mod failure;
pub mod provider;
pub mod result;

pub use compiler::{CompileRequest, Compiler};
pub use context::BuildContext;
pub use error::CompileError;
pub use failure::{FailureReason, UnitFailure};
pub use provider::VersionProvider;
pub use result::{BuildResult, CompiledUnit};
