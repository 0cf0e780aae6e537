//! In-memory storage engine for testing.

use crate::engine::{BatchOp, StorageEngine, WriteBatch};
use crate::error::StorageResult;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::Path;

/// An in-memory storage engine.
///
/// This engine keeps all entries in memory and is suitable for:
/// - Unit tests
/// - Ephemeral stores that don't need persistence
///
/// `open` ignores the directory; every opened engine starts empty and its
/// contents are lost when it is dropped.
///
/// # Thread Safety
///
/// This engine is thread-safe and can be shared across threads. A batch is
/// applied under a single write lock, so readers see all of it or none.
///
/// # Example
///
/// ```rust
/// use kvshare_storage::{InMemoryEngine, StorageEngine};
///
/// let engine = InMemoryEngine::new();
/// engine.put(b"key", b"value").unwrap();
/// assert_eq!(engine.get(b"key").unwrap(), Some(b"value".to_vec()));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryEngine {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl InMemoryEngine {
    /// Creates a new empty in-memory engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl StorageEngine for InMemoryEngine {
    fn open(_dir: &Path, _create_if_missing: bool) -> StorageResult<Self> {
        Ok(Self::new())
    }

    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn multi_get(&self, keys: &[Vec<u8>]) -> StorageResult<Vec<Option<Vec<u8>>>> {
        let entries = self.entries.read();
        Ok(keys.iter().map(|key| entries.get(key).cloned()).collect())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.entries.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> StorageResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn write(&self, batch: WriteBatch) -> StorageResult<()> {
        let mut entries = self.entries.write();
        for op in batch {
            match op {
                BatchOp::Put { key, value } => {
                    entries.insert(key, value);
                }
                BatchOp::Delete { key } => {
                    entries.remove(&key);
                }
            }
        }
        Ok(())
    }
}
