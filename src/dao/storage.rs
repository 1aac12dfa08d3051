use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying medium.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached, read or written.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// What the backend was doing.
        message: String,
        /// Underlying failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The persisted document exists but could not be decoded, typically
    /// because another writer is replacing it right now.
    #[error("storage document undecodable: {message}")]
    Decode {
        /// What the backend was decoding.
        message: String,
        /// Underlying failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a decode error from a serialization failure.
    pub fn decode(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Decode {
            message,
            source: Box::new(source),
        }
    }

    /// Whether the document exists but could not be decoded.
    pub fn is_decode(&self) -> bool {
        matches!(self, StorageError::Decode { .. })
    }
}
