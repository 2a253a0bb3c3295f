//! Driving the Solidity compiler through its standard JSON interface.
//!
//! [`build_input`] assembles the [`SolcInput`] for one compilation unit,
//! adjusting settings to what the chosen compiler release supports;
//! [`command_args`] produces the matching command line, and [`SolcRunner`]
//! runs the compiler and parses its [`SolcOutput`].

#![warn(missing_docs)]

pub mod args;
pub mod error;
pub mod evm;
pub mod input;
pub mod output;
pub mod runner;

pub use args::{command_args, PathArgs};
pub use error::DriverError;
pub use evm::{adjust_settings, max_evm_version};
pub use input::{
    build_input, default_output_selection, narrow_output_selection, MetadataSettings,
    OptimizerSettings, OutputSelection, SolcInput, SolcSettings, SourceInput,
};
pub use output::{ErrorSourceLocation, SecondarySourceLocation, SolcError, SolcOutput, SourceOutput};
pub use runner::SolcRunner;
