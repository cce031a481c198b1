//! Storage error types.

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid range: {0}")]
    InvalidRange(String),
}

impl StorageError {
    /// Whether the object should be treated as absent by callers.
    ///
    /// Covers keys that do not resolve to a readable file inside the store
    /// root, not only plain "no such file".
    pub fn is_missing(&self) -> bool {
        match self {
            Self::NotFound(_) | Self::InvalidKey(_) => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::PermissionDenied,
            Self::InvalidRange(_) => false,
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
