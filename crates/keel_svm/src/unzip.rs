//! Unpacking of the zipped Windows releases.
//!
//! Old Windows releases ship as a zip holding `solc.exe`, `soltest.exe`, and
//! runtime DLLs.

use crate::error::SvmError;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// Extracts the compiler from `zip_path` into its directory.
///
/// `solc.exe` is written as `solc_path`, `soltest.exe` is skipped, and every
/// other member lands next to the compiler. The archive is deleted
/// afterwards.
pub fn extract_solc(zip_path: &Path, solc_path: &Path) -> Result<PathBuf, SvmError> {
    let archive_err = |reason: String| SvmError::Archive {
        path: zip_path.to_path_buf(),
        reason,
    };
    let base = zip_path.parent().unwrap_or_else(|| Path::new("."));
    let file = File::open(zip_path).map_err(|e| SvmError::io(zip_path, e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| archive_err(e.to_string()))?;

    for i in 0..archive.len() {
        let mut member = archive.by_index(i).map_err(|e| archive_err(e.to_string()))?;
        if member.is_dir() {
            continue;
        }
        let Some(name) = member.enclosed_name() else {
            return Err(archive_err(format!("unsafe member path '{}'", member.name())));
        };
        let dest = match name.to_str() {
            Some("soltest.exe") => continue,
            Some("solc.exe") => solc_path.to_path_buf(),
            _ => base.join(&name),
        };
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SvmError::io(parent, e))?;
        }
        let mut out = File::create(&dest).map_err(|e| SvmError::io(&dest, e))?;
        io::copy(&mut member, &mut out).map_err(|e| SvmError::io(&dest, e))?;
    }

    std::fs::remove_file(zip_path).map_err(|e| SvmError::io(zip_path, e))?;
    Ok(solc_path.to_path_buf())
}
