//! Source unit naming, the import graph, and compilation-unit partitioning.
//!
//! Files are identified to the compiler by *source unit names*. The
//! [`SourceUnitNameResolver`] turns import literals and command-line paths
//! into names, the [`SourcePathLocator`] maps names back to files, and the
//! [`GraphBuilder`] walks imports from a set of seed files to produce an
//! [`ImportGraph`]. [`partition`] then splits the graph into
//! [`CompilationUnit`]s, each of which can be handed to one compiler run.

#![warn(missing_docs)]

pub mod builder;
pub mod error;
pub mod graph;
pub mod locate;
pub mod partition;
pub mod resolver;

use std::collections::BTreeMap;
use std::path::PathBuf;

pub use builder::GraphBuilder;
pub use error::GraphError;
pub use graph::{ImportGraph, ImportNode};
pub use locate::SourcePathLocator;
pub use partition::{merge_units, partition, CompilationUnit};
pub use resolver::SourceUnitNameResolver;

/// In-memory file contents that take precedence over the filesystem, keyed
/// by absolute path.
pub type Overrides = BTreeMap<PathBuf, String>;
