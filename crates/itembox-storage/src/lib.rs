//! Local filesystem storage for derived images.
//!
//! Files live flat under a configured uploads directory and are served
//! read-only under `{base_url}/{filename}`. Deletion is idempotent: removing
//! an already-absent file is success, so cleanup tolerates manual deletions
//! and races.

mod local;

pub use local::LocalStorage;

use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Invalid storage filename: {0}")]
    InvalidFilename(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
