//! Error types for the reconciliation model.

use thiserror::Error;

/// Errors raised while building model values.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// A reference code appeared twice while duplicates are rejected.
    #[error("duplicate reference code '{code}' in {system} list")]
    DuplicateReferenceCode { code: String, system: String },

    /// A match score was neither an integer in 0..=100 nor "-".
    #[error("invalid match score '{value}'")]
    InvalidScore { value: String },
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
