//! Upload through an external copy tool (`azcopy` by default).
//!
//! The tool is run once as `<program> copy <file> <destination>`
//! and awaited. Its standard output is returned on success; anything on
//! standard error counts as a failure, even with a zero exit status.

use std::path::Path;
use std::process::Output;
use tokio::process::Command;

use crate::error::TransferError;

pub const DEFAULT_PROGRAM: &str = "azcopy";

#[derive(Debug, Clone)]
pub struct TransferTool {
    program: String,
}

impl TransferTool {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Copy `file` to `destination`, returning the tool's standard output.
    pub async fn copy(&self, file: &Path, destination: &str) -> Result<String, TransferError> {
        let output = Command::new(&self.program)
            .arg("copy")
            .arg(file)
            .arg(destination)
            .output()
            .await
            .map_err(|source| TransferError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        self.check_output(output)
    }

    /// Standard output of a finished run, or the failure it reports.
    fn check_output(&self, output: Output) -> Result<String, TransferError> {
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            return Err(TransferError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr,
            });
        }
        if !stderr.is_empty() {
            return Err(TransferError::Stderr {
                program: self.program.clone(),
                stderr,
            });
        }
        Ok(stdout)
    }
}
