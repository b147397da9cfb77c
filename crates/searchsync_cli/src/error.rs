//! CLI error types.

use searchsync_core::SyncError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or using a dataset.
#[derive(Debug, Error)]
pub enum CliError {
    /// The dataset file could not be read.
    #[error("cannot read dataset {path}: {source}")]
    Io {
        /// Dataset path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The dataset file is not valid dataset JSON.
    #[error("invalid dataset {path}: {source}")]
    Parse {
        /// Dataset path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// `check` found problems.
    #[error("dataset has {count} problem(s)")]
    Invalid {
        /// Number of problems.
        count: usize,
    },

    /// Unsupported output format.
    #[error("unknown output format: {0} (expected text or json)")]
    UnknownFormat(String),

    /// Error from the synchronization core.
    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;
