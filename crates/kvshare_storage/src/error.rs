//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Another engine instance holds the directory lock.
    #[error("storage directory locked: {}", path.display())]
    Locked {
        /// The locked directory.
        path: PathBuf,
    },

    /// The store does not exist and creation was not requested.
    #[error("store not found: {}", path.display())]
    NotFound {
        /// Path of the missing data file.
        path: PathBuf,
    },

    /// The embedded engine reported an error.
    #[error("engine error: {0}")]
    Engine(#[from] redb::Error),
}

macro_rules! from_redb {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for StorageError {
                fn from(err: $ty) -> Self {
                    Self::Engine(redb::Error::from(err))
                }
            }
        )*
    };
}

from_redb!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);
