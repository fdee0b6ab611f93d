//! Error types for matching and checkpointing.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the matching pipeline.
#[derive(Debug, Error)]
pub enum MatchError {
    /// Failed to create a checkpoint directory.
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a checkpoint file.
    #[error("failed to write checkpoint {path}: {source}")]
    CheckpointWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Failed to read a checkpoint file.
    #[error("failed to read checkpoint {path}: {source}")]
    CheckpointRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Operator interaction failed.
    #[error("operator prompt failed: {0}")]
    Prompt(#[source] std::io::Error),
}

/// Result type for matching operations.
pub type Result<T> = std::result::Result<T, MatchError>;
