//! Error types for batch runs.
//!
//! Everything here except [`BatchError::Config`] and [`BatchError::Pattern`]
//! is scoped to a single document: the runner records it and moves on.

use thiserror::Error;
use thymeml::{FormatError, StoreError};

#[derive(Debug, Error)]
pub enum BatchError {
    /// A file or directory could not be read.
    #[error("failed to load {path}: {message}")]
    Load { path: String, message: String },

    /// The annotation file is not valid THYME-ML.
    #[error("{path}: {source}")]
    Format { path: String, source: FormatError },

    #[error("{document}: {source}")]
    Store { document: String, source: StoreError },

    #[error("invalid configuration {path}: {message}")]
    Config { path: String, message: String },

    #[error("invalid {key} pattern: {source}")]
    Pattern {
        key: &'static str,
        source: regex::Error,
    },

    /// An output file could not be written.
    #[error("failed to write {path}: {message}")]
    Output { path: String, message: String },
}

/// Result type for batch operations.
pub type BatchResult<T> = Result<T, BatchError>;
