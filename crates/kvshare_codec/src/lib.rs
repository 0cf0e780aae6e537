//! # KVShare Codec
//!
//! Byte encoding for the keys and values stored through KVShare.
//!
//! Storage engines only see opaque byte strings. A [`Codec`] turns typed
//! keys and values into those bytes and back again. Two rules apply to
//! every implementation:
//!
//! - `decode(encode(v)) == v` for every type used as a key or value
//! - encoding is deterministic, because encoded keys are compared bytewise
//!
//! A decode failure is reported as [`CodecError::DecodingFailed`], which the
//! layers above keep distinct from "key not found".
//!
//! ## Usage
//!
//! ```
//! use kvshare_codec::{CborCodec, Codec};
//!
//! let codec = CborCodec;
//! let bytes = codec.encode("hello").unwrap();
//! let decoded: String = codec.decode(&bytes).unwrap();
//! assert_eq!(decoded, "hello");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cbor;
mod error;

pub use cbor::CborCodec;
pub use error::{CodecError, CodecResult};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Converts typed values to bytes and back.
///
/// Codecs are shared between threads by every handle that uses them, so
/// implementations must be `Send + Sync` and hold no per-call state.
pub trait Codec: Send + Sync {
    /// Encodes `value` to bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::EncodingFailed`] if the value cannot be
    /// represented by this codec.
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> CodecResult<Vec<u8>>;

    /// Decodes bytes previously produced by [`Codec::encode`].
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::DecodingFailed`] if the bytes are malformed or
    /// do not describe a `T`.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> CodecResult<T>;
}
