//! Keel CLI: the command-line interface for the Keel Solidity build engine.
//!
//! Provides `keel compile` for building a project's contracts and
//! `keel svm` for managing installed solc releases.

#![warn(missing_docs)]

mod compile;
mod pipeline;
mod svm;

use std::io::IsTerminal;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Environment variable overriding the log filter.
const LOG_ENV: &str = "KEEL_LOG";

/// Keel: incremental Solidity compilation.
#[derive(Parser, Debug)]
#[command(name = "keel", version, about = "Keel Solidity build engine")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `keel.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile the project's Solidity sources.
    Compile(CompileArgs),
    /// Manage solc releases.
    Svm {
        /// The svm action.
        #[command(subcommand)]
        command: SvmCommand,
    },
}

/// Arguments for the `keel compile` subcommand.
#[derive(Parser, Debug)]
pub struct CompileArgs {
    /// Files or directories to compile. Defaults to the whole project.
    pub paths: Vec<String>,

    /// Ignore the previous build and compile everything.
    #[arg(long)]
    pub force: bool,

    /// Only report errors.
    #[arg(long)]
    pub no_warnings: bool,

    /// Keep one compilation unit per entry file.
    #[arg(long, conflicts_with = "no_incremental")]
    pub incremental: bool,

    /// Merge compatible compilation units.
    #[arg(long)]
    pub no_incremental: bool,

    /// Output format for diagnostics.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

impl CompileArgs {
    /// The incremental mode requested on the command line, if any.
    pub fn incremental(&self) -> Option<bool> {
        match (self.incremental, self.no_incremental) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

/// `keel svm` actions.
#[derive(Subcommand, Debug)]
pub enum SvmCommand {
    /// List installed releases, or every release with `--all`.
    List {
        /// List every release available for this platform.
        #[arg(long)]
        all: bool,
    },
    /// Install a release.
    Install {
        /// The version to install, e.g. `0.8.24`.
        version: String,
        /// Reinstall even if the release is present.
        #[arg(long)]
        force: bool,
    },
    /// Remove an installed release.
    Remove {
        /// The version to remove.
        version: String,
    },
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Diagnostic output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// One JSON object per diagnostic per line.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };
    init_tracing(&global);

    let result = match cli.command {
        Command::Compile(ref args) => compile::run(args, &global).await,
        Command::Svm { ref command } => svm::run(command, &global).await,
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the log subscriber. `KEEL_LOG` wins over the verbosity flags.
fn init_tracing(global: &GlobalArgs) {
    let default = if global.verbose {
        "debug"
    } else if global.quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(global.color)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_compile_default() {
        let cli = Cli::parse_from(["keel", "compile"]);
        match cli.command {
            Command::Compile(ref args) => {
                assert!(args.paths.is_empty());
                assert!(!args.force);
                assert!(!args.no_warnings);
                assert_eq!(args.incremental(), None);
                assert_eq!(args.format, ReportFormat::Text);
            }
            _ => panic!("expected Compile command"),
        }
    }

    #[test]
    fn parse_compile_with_args() {
        let cli = Cli::parse_from([
            "keel",
            "compile",
            "contracts/Token.sol",
            "contracts/Sale.sol",
            "--force",
            "--no-warnings",
            "--no-incremental",
            "--format",
            "json",
        ]);
        match cli.command {
            Command::Compile(ref args) => {
                assert_eq!(args.paths, vec!["contracts/Token.sol", "contracts/Sale.sol"]);
                assert!(args.force);
                assert!(args.no_warnings);
                assert_eq!(args.incremental(), Some(false));
                assert_eq!(args.format, ReportFormat::Json);
            }
            _ => panic!("expected Compile command"),
        }
    }

    #[test]
    fn incremental_flags_conflict() {
        let parsed = Cli::try_parse_from(["keel", "compile", "--incremental", "--no-incremental"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn parse_svm_install() {
        let cli = Cli::parse_from(["keel", "svm", "install", "0.8.24", "--force"]);
        match cli.command {
            Command::Svm {
                command: SvmCommand::Install { version, force },
            } => {
                assert_eq!(version, "0.8.24");
                assert!(force);
            }
            _ => panic!("expected svm install"),
        }
    }

    #[test]
    fn parse_svm_list_all() {
        let cli = Cli::parse_from(["keel", "svm", "list", "--all"]);
        assert!(matches!(
            cli.command,
            Command::Svm {
                command: SvmCommand::List { all: true }
            }
        ));
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["keel", "--quiet", "--color", "never", "compile"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.color, ColorChoice::Never);
    }

    #[test]
    fn parse_config_path() {
        let cli = Cli::parse_from(["keel", "--config", "/path/to/keel.toml", "svm", "list"]);
        assert_eq!(cli.config.as_deref(), Some("/path/to/keel.toml"));
    }
}
