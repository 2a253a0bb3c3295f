//! Shared helpers for CLI commands.
//!
//! Contains project root resolution, configuration loading, Solidity source
//! discovery, and construction of the compiler version manager.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use keel_config::{KeelConfig, CONFIG_FILE_NAME};
use keel_svm::{HttpSource, SolcVersionManager};

use crate::GlobalArgs;

/// Directories never searched for sources.
const SKIPPED_DIRS: &[&str] = &["node_modules", ".keel"];

/// Walks up from `start` looking for the nearest directory containing `keel.toml`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE_NAME).is_file() {
            return Some(current);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Resolves the project root directory from global CLI args.
///
/// If `--config` is specified, uses that path (file → parent dir, dir → itself).
/// Otherwise walks up from the current directory looking for `keel.toml`,
/// falling back to the current directory.
pub fn resolve_project_root(global: &GlobalArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    match global.config {
        Some(ref config_path) => {
            let p = keel_config::normalize_path(&cwd, Path::new(config_path));
            if p.is_dir() {
                Ok(p)
            } else {
                Ok(p.parent().map(Path::to_path_buf).unwrap_or(cwd))
            }
        }
        None => Ok(find_project_root(&cwd).unwrap_or(cwd)),
    }
}

/// Loads the project configuration, honoring `--config`.
pub fn load_project_config(
    project_dir: &Path,
    global: &GlobalArgs,
) -> Result<KeelConfig, Box<dyn std::error::Error>> {
    let config = match global.config {
        Some(ref path) if Path::new(path).is_file() => {
            keel_config::load_config_file(Path::new(path), project_dir)?
        }
        Some(ref path) => {
            let path = Path::new(path);
            if !path.exists() {
                return Err(format!("config file {} does not exist", path.display()).into());
            }
            keel_config::load_config(path)?
        }
        None => keel_config::load_config(project_dir)?,
    };
    Ok(config)
}

/// Discovers `.sol` files under `dir` (recursive), sorted by path.
///
/// Hidden directories, `node_modules`, `.keel`, and everything under one of
/// `exclude` are skipped.
pub fn discover_source_files(
    dir: &Path,
    exclude: &[PathBuf],
) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut files = Vec::new();
    walk_dir(dir, exclude, &mut files)?;
    files.sort();
    Ok(files)
}

/// Recursively walks a directory collecting Solidity files.
fn walk_dir(
    dir: &Path,
    exclude: &[PathBuf],
    files: &mut Vec<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if exclude.iter().any(|e| path.starts_with(e)) {
            continue;
        }
        if path.is_dir() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref()) {
                continue;
            }
            walk_dir(&path, exclude, files)?;
        } else if is_solidity(&path) {
            files.push(path);
        }
    }
    Ok(())
}

/// Returns `true` for `*.sol` files.
pub fn is_solidity(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "sol")
}

/// Expands command-line paths into Solidity files. Directories are searched
/// recursively; files are taken as given.
pub fn expand_paths(
    project_dir: &Path,
    paths: &[String],
    exclude: &[PathBuf],
) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    if paths.is_empty() {
        return discover_source_files(project_dir, exclude);
    }
    let mut files = Vec::new();
    for p in paths {
        let path = keel_config::normalize_path(&cwd, Path::new(p));
        if path.is_dir() {
            files.extend(discover_source_files(&path, exclude)?);
        } else if path.is_file() {
            files.push(path);
        } else {
            return Err(format!("{} does not exist", path.display()).into());
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// The library directory shipped with the tool, if installed.
pub fn bundled_path(data_dir: &Path) -> Option<PathBuf> {
    let path = data_dir.join("bundled");
    path.is_dir().then_some(path)
}

/// Creates the solc version manager over the global data directory.
pub fn version_manager(data_dir: &Path) -> Result<Arc<SolcVersionManager>, Box<dyn std::error::Error>> {
    let manager = SolcVersionManager::new(data_dir, Arc::new(HttpSource::new()))?;
    Ok(Arc::new(manager))
}
