//! Running a compiler binary.

use crate::error::DriverError;
use crate::input::SolcInput;
use crate::output::SolcOutput;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Runs one compiler binary in standard JSON mode.
#[derive(Debug, Clone)]
pub struct SolcRunner {
    binary: PathBuf,
    cwd: PathBuf,
}

impl SolcRunner {
    /// A runner for `binary`, started in `cwd` (the project root).
    pub fn new(binary: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            cwd: cwd.into(),
        }
    }

    /// The compiler binary.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Feeds `input` to the compiler on stdin and parses stdout.
    ///
    /// Compilation errors are part of a successful [`SolcOutput`]; only a
    /// failing process or unreadable output is an error. The child is killed
    /// if the returned future is dropped.
    pub async fn run(&self, args: &[String], input: &SolcInput) -> Result<SolcOutput, DriverError> {
        let payload = serde_json::to_vec(input).map_err(|e| DriverError::Serialize {
            reason: e.to_string(),
        })?;

        tracing::debug!(binary = %self.binary.display(), ?args, "running solc");
        let mut child = Command::new(&self.binary)
            .args(args)
            .current_dir(&self.cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| DriverError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        let stdin = child.stdin.take();
        let write = async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(&payload).await?;
                stdin.shutdown().await?;
            }
            Ok::<(), std::io::Error>(())
        };
        // stdout must be drained while stdin is written.
        let (written, output) = tokio::join!(write, child.wait_with_output());
        let output = output?;

        if !output.status.success() {
            return Err(DriverError::SolcFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        written?;

        serde_json::from_slice(&output.stdout).map_err(|e| DriverError::MalformedOutput {
            reason: e.to_string(),
        })
    }
}
