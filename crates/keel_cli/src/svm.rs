//! `keel svm`: list, install, and remove solc releases.

use std::collections::BTreeSet;
use std::io::Write;

use keel_common::SemanticVersion;

use crate::pipeline::version_manager;
use crate::{GlobalArgs, SvmCommand};

/// Runs a `keel svm` action. Returns exit code 0 on success.
pub async fn run(command: &SvmCommand, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let data_dir = keel_config::data_dir()?;
    let manager = version_manager(&data_dir)?;

    match command {
        SvmCommand::List { all } => {
            let installed: BTreeSet<SemanticVersion> =
                manager.installed_versions()?.into_iter().collect();
            let versions: Vec<SemanticVersion> = if *all {
                manager.list_all(true).await?
            } else {
                installed.iter().cloned().collect()
            };
            if versions.is_empty() && !global.quiet {
                eprintln!("no solc releases installed");
            }
            for version in versions.iter().rev() {
                let marker = if *all && installed.contains(version) {
                    " (installed)"
                } else {
                    ""
                };
                println!("{version}{marker}");
            }
        }
        SvmCommand::Install { version, force } => {
            let version: SemanticVersion = version.parse()?;
            if !global.quiet {
                eprintln!("   Installing solc {version}");
            }
            let quiet = global.quiet;
            let progress = move |received: u64, total: Option<u64>| {
                if quiet {
                    return;
                }
                match total {
                    Some(total) if total > 0 => {
                        eprint!("\r   Downloaded {}%", received * 100 / total);
                    }
                    _ => eprint!("\r   Downloaded {} KiB", received / 1024),
                }
                let _ = std::io::stderr().flush();
            };
            let path = manager.install(&version, *force, Some(&progress)).await?;
            if !global.quiet {
                eprintln!("\r   Installed solc {version} at {}", path.display());
            }
        }
        SvmCommand::Remove { version } => {
            let version: SemanticVersion = version.parse()?;
            manager.remove(&version).await?;
            if !global.quiet {
                eprintln!("   Removed solc {version}");
            }
        }
    }
    Ok(0)
}
