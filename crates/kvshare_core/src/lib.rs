//! # KVShare Core
//!
//! Shared connections to an embedded key-value store.
//!
//! The storage engine allows one connection per directory, yet many logical
//! maps may want to live in the same directory. This crate provides:
//! - [`DatabaseHandle`]: the typed, thread-safe connection to one directory
//! - [`ConnectionRegistry`]: reference-counted sharing of handles between
//!   consumers, keyed by normalized directory
//! - [`MapStore`]: a typed map adapter that is one registry consumer
//! - [`MapStoreConfig`]: map store configuration, also readable from
//!   string properties
//!
//! ## Lifecycle
//!
//! ```text
//! acquire(dir, c1) ──► open handle ──► {c1}
//! acquire(dir, c2) ──► same handle ──► {c1, c2}
//! release(dir, c1) ──────────────────► {c2}
//! release(dir, c2) ──► close handle ──► unregistered
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use kvshare_core::{ConnectionRegistry, MapStore, MapStoreConfig};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(ConnectionRegistry::new());
//! let store: MapStore<String, String> =
//!     MapStore::open(registry, &MapStoreConfig::new("my_store"))?;
//! store.store(&"greeting".to_string(), &"hello".to_string())?;
//! assert_eq!(store.load(&"greeting".to_string())?.as_deref(), Some("hello"));
//! store.destroy()?;
//! # Ok::<(), kvshare_core::CoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod dir;
mod error;
mod handle;
mod map_store;
mod registry;

pub use config::{
    MapStoreConfig, DATABASE_AUTOCREATE_PROPERTY, DATABASE_PATH_PROPERTY, DEFAULT_AUTO_CREATE,
};
pub use error::{CoreError, CoreResult};
pub use handle::DatabaseHandle;
pub use map_store::MapStore;
pub use registry::{ConnectionRegistry, ConsumerId};

// Re-export the layers below so callers can name engines and codecs
pub use kvshare_codec::{CborCodec, Codec, CodecError};
pub use kvshare_storage::{InMemoryEngine, RedbEngine, StorageEngine, StorageError};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
