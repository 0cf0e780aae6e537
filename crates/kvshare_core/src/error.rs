//! Error types for KVShare core.

use crate::registry::ConsumerId;
use kvshare_codec::CodecError;
use kvshare_storage::StorageError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in KVShare core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Bad directory or configuration value. Not retryable.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the problem.
        message: String,
    },

    /// The storage engine could not be opened.
    #[error("failed to open store at {}: {source}", directory.display())]
    StorageOpen {
        /// Directory of the store.
        directory: PathBuf,
        /// Underlying engine error.
        #[source]
        source: StorageError,
    },

    /// A read from the storage engine failed.
    #[error("read from store at {} failed: {source}", directory.display())]
    StorageRead {
        /// Directory of the store.
        directory: PathBuf,
        /// Underlying engine error.
        #[source]
        source: StorageError,
    },

    /// A write to the storage engine failed.
    #[error("write to store at {} failed: {source}", directory.display())]
    StorageWrite {
        /// Directory of the store.
        directory: PathBuf,
        /// Underlying engine error.
        #[source]
        source: StorageError,
    },

    /// The handle was used after it was closed.
    #[error("handle for {} is closed", directory.display())]
    HandleClosed {
        /// Directory of the closed handle.
        directory: PathBuf,
    },

    /// A key or value could not be encoded.
    #[error("serialization failed: {0}")]
    Serialization(#[source] CodecError),

    /// Stored bytes do not decode to the requested type.
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] CodecError),

    /// `release` was called without a matching `acquire`.
    #[error("consumer {consumer} does not hold a handle for {}", directory.display())]
    UnknownConsumer {
        /// Directory passed to `release`.
        directory: PathBuf,
        /// The unknown consumer.
        consumer: ConsumerId,
    },
}

impl CoreError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
