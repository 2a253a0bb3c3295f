//! Command line arguments for a compiler invocation.

use keel_common::SemanticVersion;
use std::path::PathBuf;

/// First release with `--base-path` and `--include-path`.
const INCLUDE_PATHS_SINCE: SemanticVersion = SemanticVersion::new(0, 8, 8);

/// Filesystem locations the compiler may read from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathArgs {
    /// Extra `--allow-paths` entries.
    pub allow_paths: Vec<PathBuf>,
    /// Library roots passed as `--include-path`.
    pub include_paths: Vec<PathBuf>,
    /// The bundled library directory, always an include path when set.
    pub bundled: Option<PathBuf>,
}

/// Arguments running the compiler of `version` in standard JSON mode from
/// the project root.
///
/// Releases before 0.8.8 receive inline sources and only need the allowed
/// paths.
pub fn command_args(version: &SemanticVersion, paths: &PathArgs) -> Vec<String> {
    let mut args = vec!["--standard-json".to_string()];

    let mut allow = vec![".".to_string()];
    allow.extend(paths.allow_paths.iter().map(|p| p.display().to_string()));
    args.push(format!("--allow-paths={}", allow.join(",")));

    if *version >= INCLUDE_PATHS_SINCE {
        args.push("--base-path=.".to_string());
        for include in paths.include_paths.iter().chain(paths.bundled.iter()) {
            args.push(format!("--include-path={}", include.display()));
        }
    }
    args
}
