//! Error types for the repack pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by the pipeline stages. None of them are retried.
#[derive(Debug, Error)]
pub enum RepackError {
    /// The book string does not follow "<title> - Written by <author> - Narrated by <narrator>"
    #[error("Could not parse book information from title: '{title}'")]
    UnparseableTitle { title: String },

    /// The inspector exited non-zero or printed something we could not read
    #[error("Failed to probe {path}: {stderr} (status: {status})")]
    ProbeFailure {
        path: PathBuf,
        status: String,
        stderr: String,
    },

    #[error("Probing {path} did not finish within {secs}s")]
    ProbeTimeout { path: PathBuf, secs: u64 },

    #[error("{tool} process exited with code {exit_code}")]
    ExternalTool { tool: String, exit_code: i32 },

    #[error("Failed to launch {tool}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Lost track of {tool} while it was running")]
    Wait {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Interrupted before the output file was finished")]
    Cancelled,

    #[error("No .m4a files found in {}", folder.display())]
    NoInputFiles { folder: PathBuf },
}

impl RepackError {
    /// Build a probe failure for output the inspector printed successfully but we could not use
    pub fn unparseable_output(path: impl Into<PathBuf>, output: &str) -> Self {
        RepackError::ProbeFailure {
            path: path.into(),
            status: "exit status: 0".to_string(),
            stderr: format!("unexpected output '{}'", output.trim()),
        }
    }
}

pub type RepackResult<T> = std::result::Result<T, RepackError>;
