//! Error types for the seqgraph binary

use seqgraph_reducer::ReduceError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while processing input files
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem error on a specific path
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV decoding error
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Reduction aborted on a malformed row
    #[error("Reduction failed for {path}: {source}")]
    Reduce {
        path: PathBuf,
        #[source]
        source: ReduceError,
    },

    /// JSON encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A worker task panicked or was cancelled
    #[error("Task error: {0}")]
    Task(String),
}

impl From<config::ConfigError> for CliError {
    fn from(err: config::ConfigError) -> Self {
        CliError::Config(err.to_string())
    }
}

impl CliError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CliError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;
