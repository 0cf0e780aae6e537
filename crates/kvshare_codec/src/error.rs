//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during encoding or decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Failed to encode a value to bytes.
    #[error("encoding failed: {message}")]
    EncodingFailed {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode bytes into the requested type.
    #[error("decoding {type_name} failed: {message}")]
    DecodingFailed {
        /// Name of the type that was requested.
        type_name: &'static str,
        /// Description of the decoding error.
        message: String,
    },
}

impl CodecError {
    /// Create an encoding failed error.
    pub fn encoding_failed(message: impl Into<String>) -> Self {
        Self::EncodingFailed {
            message: message.into(),
        }
    }

    /// Create a decoding failed error for the target type `T`.
    pub fn decoding_failed<T: ?Sized>(message: impl Into<String>) -> Self {
        Self::DecodingFailed {
            type_name: std::any::type_name::<T>(),
            message: message.into(),
        }
    }
}
