//! # KVShare Storage
//!
//! Storage engine trait and implementations for KVShare.
//!
//! This crate is the lowest layer of KVShare. Storage engines are **opaque
//! byte stores** rooted at one directory: they know nothing about codecs,
//! consumers or connection sharing.
//!
//! ## Design Principles
//!
//! - One engine value is the one live connection to its directory
//! - Single-key writes and whole batches are atomic
//! - Must be `Send + Sync`; every operation takes `&self`
//! - Dropping the engine closes the connection
//!
//! ## Available Engines
//!
//! - [`RedbEngine`] - Persistent storage in a redb file
//! - [`InMemoryEngine`] - For testing and ephemeral storage
//!
//! ## Example
//!
//! ```rust
//! use kvshare_storage::{InMemoryEngine, StorageEngine, WriteBatch};
//!
//! let engine = InMemoryEngine::new();
//! let mut batch = WriteBatch::new();
//! batch.put(b"a".to_vec(), b"1".to_vec());
//! batch.put(b"b".to_vec(), b"2".to_vec());
//! engine.write(batch).unwrap();
//! assert_eq!(engine.get(b"b").unwrap(), Some(b"2".to_vec()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod engine;
mod error;
mod memory;
mod redb_engine;

pub use engine::{BatchOp, StorageEngine, WriteBatch};
pub use error::{StorageError, StorageResult};
pub use memory::InMemoryEngine;
pub use redb_engine::{RedbEngine, DATA_FILE, LOCK_FILE};
