//! Error types for input loading.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while loading input files.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Input file not found.
    #[error("input file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Parsing Errors ===
    /// Malformed CSV content.
    #[error("failed to parse CSV {path}: {source}")]
    CsvParse {
        path: PathBuf,
        #[source]
        source: ::csv::Error,
    },

    /// Malformed JSON content.
    #[error("failed to parse JSON {path}: {source}")]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A row is shorter than the configured layout.
    #[error("row {row} of {path} has no column {column}")]
    MissingColumn {
        path: PathBuf,
        row: usize,
        column: usize,
    },

    /// A dictionary item lacks a required field.
    #[error("item {index} of {path} has no usable '{field}' field")]
    MissingField {
        path: PathBuf,
        index: usize,
        field: String,
    },

    // === Model Errors ===
    /// Building the reference map failed.
    #[error("invalid reference list {path}: {source}")]
    Reference {
        path: PathBuf,
        #[source]
        source: rxrec_model::ModelError,
    },
}

impl IngestError {
    /// Classify an I/O error raised while opening `path`.
    pub(crate) fn open(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::FileRead {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::FileNotFound {
            path: PathBuf::from("/path/to/meds.csv"),
        };
        assert_eq!(err.to_string(), "input file not found: /path/to/meds.csv");
    }

    #[test]
    fn test_open_classifies_not_found() {
        let err = IngestError::open(
            Path::new("missing.csv"),
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(matches!(err, IngestError::FileNotFound { .. }));

        let err = IngestError::open(
            Path::new("locked.csv"),
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(err, IngestError::FileRead { .. }));
    }
}
