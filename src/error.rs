//! Error types for the batch organizer

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for batch organizer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the batch organizer
///
/// Precondition variants are returned before an operation touches the
/// filesystem. Item-level variants are only ever rendered into an
/// operation log; they never escape a batch.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Invalid single GIF file path: '{path}'")]
    InvalidFrameSource { path: PathBuf },

    #[error("Invalid file extension: '{0}'")]
    InvalidExtension(String),

    #[error("Scale factor must be a positive number, got {0}")]
    InvalidScale(f64),

    #[error("Quality must be between 1 and 100, got {0}")]
    InvalidQuality(u8),

    #[error("Unsupported output format: '{0}'")]
    UnsupportedOutputFormat(String),

    #[error("File hash computation failed for {path}: {message}")]
    HashComputation { path: PathBuf, message: String },

    #[error("Could not find a free name for '{name}' in {dir}")]
    NameExhausted { dir: PathBuf, name: String },

    #[error("Failed to decode image {path}: {message}")]
    ImageDecode { path: PathBuf, message: String },

    #[error("Failed to encode image {path}: {message}")]
    ImageEncode { path: PathBuf, message: String },

    #[error("Directory traversal error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
