//! Storage engine trait definition.

use crate::error::StorageResult;
use std::path::Path;

/// A connection to an embedded key-value engine rooted at one directory.
///
/// Engines are **opaque byte stores**. They never see typed keys or values;
/// encoding is the caller's concern.
///
/// # Invariants
///
/// - `open` returns the only live connection for its directory; a second
///   `open` on the same directory fails while the first is alive
/// - single-key writes are atomic (no partial key or value)
/// - `write` applies a whole [`WriteBatch`] or none of it
/// - `multi_get` returns one result per requested key, in request order
/// - dropping the engine releases the connection and the directory lock
/// - every method takes `&self`; engines are safe to share across threads
///
/// # Implementors
///
/// - [`super::RedbEngine`] - For persistent storage
/// - [`super::InMemoryEngine`] - For testing
pub trait StorageEngine: Send + Sync + Sized {
    /// Opens the store in `dir`, which must already exist.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The store does not exist and `create_if_missing` is false
    /// - Another connection holds the directory lock
    /// - The engine cannot read its files
    fn open(dir: &Path, create_if_missing: bool) -> StorageResult<Self>;

    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine read fails.
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    /// Reads several keys from one consistent view of the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine read fails.
    fn multi_get(&self, keys: &[Vec<u8>]) -> StorageResult<Vec<Option<Vec<u8>>>>;

    /// Writes a single key.
    ///
    /// The write is durable when this returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine write fails.
    fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()>;

    /// Deletes a single key. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine write fails.
    fn delete(&self, key: &[u8]) -> StorageResult<()>;

    /// Applies every operation of `batch` atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine write fails, in which case none of
    /// the batch is visible.
    fn write(&self, batch: WriteBatch) -> StorageResult<()>;
}

/// One operation inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    /// Store `value` under `key`.
    Put {
        /// Encoded key.
        key: Vec<u8>,
        /// Encoded value.
        value: Vec<u8>,
    },
    /// Remove `key`.
    Delete {
        /// Encoded key.
        key: Vec<u8>,
    },
}

/// An ordered set of writes applied as one atomic unit.
///
/// Later operations on a key override earlier ones in the same batch.
///
/// # Example
///
/// ```rust
/// use kvshare_storage::WriteBatch;
///
/// let mut batch = WriteBatch::new();
/// batch.put(b"a".to_vec(), b"1".to_vec());
/// batch.delete(b"b".to_vec());
/// assert_eq!(batch.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty batch with room for `capacity` operations.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ops: Vec::with_capacity(capacity),
        }
    }

    /// Appends a put.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.ops.push(BatchOp::Put { key, value });
    }

    /// Appends a delete.
    pub fn delete(&mut self, key: Vec<u8>) {
        self.ops.push(BatchOp::Delete { key });
    }

    /// Returns the number of operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns true if the batch holds no operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Returns the operations in submission order.
    #[must_use]
    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }
}

impl IntoIterator for WriteBatch {
    type Item = BatchOp;
    type IntoIter = std::vec::IntoIter<BatchOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}
