//! Error types raised by replay storage.

use thiserror::Error;

/// Errors surfaced while recording or reading replays.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("JSON error at line {line}: {message}")]
    Json { line: usize, message: String },

    #[error("corrupted data: {0}")]
    CorruptedData(String),

    #[error("replay already exists: {0}")]
    LogAlreadyExists(String),

    #[error("unsupported replay version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
