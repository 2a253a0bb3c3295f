//! Shared foundational types used across the Keel build engine.
//!
//! This crate provides the semantic version algebra (versions, ranges, range
//! sets and the npm-style expression parser used by `pragma solidity`) and the
//! 256-bit content hash used for change detection and unit identity.

#![warn(missing_docs)]

pub mod error;
pub mod expr;
pub mod hash;
pub mod range;
pub mod version;

pub use error::VersionError;
pub use expr::parse_expression;
pub use hash::ContentHash;
pub use range::{UpperBound, VersionRange, VersionRanges};
pub use version::SemanticVersion;
