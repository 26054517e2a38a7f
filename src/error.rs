//! Error types shared by every stage of a benchmark session.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;
use crate::exec::Implementation;

/// Result alias used throughout the harness.
pub type Result<T> = std::result::Result<T, BenchError>;

/// Errors raised while planning or executing a benchmark session.
#[derive(Debug, Error)]
pub enum BenchError {
    /// The candidate category pool contained no usable labels.
    #[error("no TLDs provided to sample from")]
    EmptyPool,
    /// The implementation could not be started at all.
    #[error("failed to spawn {implementation} command `{command}`: {source}")]
    Spawn {
        /// Which side of the comparison was being launched.
        implementation: Implementation,
        /// Rendered command line.
        command: String,
        /// Underlying OS error.
        source: io::Error,
    },
    /// Waiting on a started child failed.
    #[error("failed to wait for {implementation} command `{command}`: {source}")]
    Wait {
        /// Which side of the comparison was running.
        implementation: Implementation,
        /// Rendered command line.
        command: String,
        /// Underlying OS error.
        source: io::Error,
    },
    /// The child's combined output could not be read back.
    #[error("failed to read output of {implementation} command `{command}`: {source}")]
    Capture {
        /// Which side of the comparison produced the output.
        implementation: Implementation,
        /// Rendered command line.
        command: String,
        /// Underlying OS error.
        source: io::Error,
    },
    /// The implementation exited unsuccessfully.
    #[error(
        "{implementation} command failed ({}): {command}\n{output}",
        describe_exit(*exit_code)
    )]
    Execution {
        /// Which side of the comparison failed.
        implementation: Implementation,
        /// Rendered command line.
        command: String,
        /// Exit code, `None` when the child was terminated by a signal.
        exit_code: Option<i32>,
        /// Combined stdout/stderr captured from the child.
        output: String,
    },
    /// The implementation exceeded the configured wait and was killed.
    #[error("{implementation} command timed out after {:.1}s: {command}\n{output}", after.as_secs_f64())]
    Timeout {
        /// Which side of the comparison hung.
        implementation: Implementation,
        /// Rendered command line.
        command: String,
        /// Deadline that was exceeded.
        after: Duration,
        /// Output captured before the child was killed.
        output: String,
    },
    /// The implementation exited cleanly but did not append its result entry.
    #[error("{implementation} run did not append to {} (expected entry #{offset})", store.display())]
    MissingEntry {
        /// Which side failed to record its result.
        implementation: Implementation,
        /// Location of the shared results store.
        store: PathBuf,
        /// Index the entry was expected at.
        offset: usize,
    },
    /// File system access failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying OS error.
        source: io::Error,
    },
    /// A JSON document could not be decoded or encoded.
    #[error("malformed JSON in {}: {source}", path.display())]
    Parse {
        /// File being decoded or encoded.
        path: PathBuf,
        /// Underlying serde error.
        source: serde_json::Error,
    },
    /// Harness configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl BenchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BenchError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        BenchError::Parse {
            path: path.into(),
            source,
        }
    }
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "terminated by signal".to_string(),
    }
}
