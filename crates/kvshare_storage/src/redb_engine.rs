//! Persistent storage engine backed by `redb`.

use crate::engine::{BatchOp, StorageEngine, WriteBatch};
use crate::error::{StorageError, StorageResult};
use fs2::FileExt;
use redb::{Database, ReadableTable, TableDefinition, TableError};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Lock file held for the lifetime of the connection.
pub const LOCK_FILE: &str = "LOCK";
/// The redb data file.
pub const DATA_FILE: &str = "data.redb";

/// The single table holding every entry: encoded key → encoded value.
const ENTRIES: TableDefinition<'static, &'static [u8], &'static [u8]> =
    TableDefinition::new("entries");

/// A storage engine persisting entries to a redb file.
///
/// Directory layout:
///
/// ```text
/// <dir>/
/// ├─ LOCK          # Advisory lock for single-connection access
/// └─ data.redb     # redb data file
/// ```
///
/// # Durability
///
/// Each `put`, `delete` and `write` runs in its own write transaction that
/// is committed with redb's default (immediate) durability before the call
/// returns.
///
/// # Thread Safety
///
/// redb serializes write transactions internally and allows concurrent
/// read transactions, so a `RedbEngine` can be shared across threads.
///
/// # Example
///
/// ```no_run
/// use kvshare_storage::{RedbEngine, StorageEngine};
/// use std::path::Path;
///
/// let engine = RedbEngine::open(Path::new("my_store"), true).unwrap();
/// engine.put(b"key", b"value").unwrap();
/// assert_eq!(engine.get(b"key").unwrap(), Some(b"value".to_vec()));
/// ```
pub struct RedbEngine {
    /// Root directory.
    path: PathBuf,
    /// Open redb database. Declared before the lock so it is dropped first.
    db: Database,
    /// Lock file handle (held for exclusive access).
    _lock_file: File,
}

impl std::fmt::Debug for RedbEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbEngine")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RedbEngine {
    /// Returns the directory this engine is rooted at.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the path to the redb data file.
    #[must_use]
    pub fn data_path(&self) -> PathBuf {
        self.path.join(DATA_FILE)
    }

    /// Creates the entries table if it is missing, so readers never see it
    /// absent. Returns true if a write transaction was committed.
    fn ensure_entries_table(db: &Database) -> StorageResult<bool> {
        {
            let txn = db.begin_read()?;
            match txn.open_table(ENTRIES) {
                Ok(_) => return Ok(false),
                Err(TableError::TableDoesNotExist(_)) => {}
                Err(err) => return Err(err.into()),
            }
        }

        let txn = db.begin_write()?;
        {
            txn.open_table(ENTRIES)?;
        }
        txn.commit()?;
        Ok(true)
    }

    fn lock_dir(dir: &Path) -> StorageResult<File> {
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE))?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(StorageError::Locked {
                path: dir.to_path_buf(),
            });
        }

        Ok(lock_file)
    }
}

impl StorageEngine for RedbEngine {
    fn open(dir: &Path, create_if_missing: bool) -> StorageResult<Self> {
        let data_path = dir.join(DATA_FILE);
        if !create_if_missing && !data_path.exists() {
            return Err(StorageError::NotFound { path: data_path });
        }

        let lock_file = Self::lock_dir(dir)?;

        let db = if create_if_missing {
            Database::create(&data_path)?
        } else {
            Database::open(&data_path)?
        };

        Self::ensure_entries_table(&db)?;

        tracing::debug!(path = %dir.display(), "redb engine opened");

        Ok(Self {
            path: dir.to_path_buf(),
            db,
            _lock_file: lock_file,
        })
    }

    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(ENTRIES)?;
        let value = table.get(key)?.map(|guard| guard.value().to_vec());
        Ok(value)
    }

    fn multi_get(&self, keys: &[Vec<u8>]) -> StorageResult<Vec<Option<Vec<u8>>>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(ENTRIES)?;

        let mut results = Vec::with_capacity(keys.len());
        for key in keys {
            let value = table.get(key.as_slice())?.map(|guard| guard.value().to_vec());
            results.push(value);
        }
        Ok(results)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(ENTRIES)?;
            table.insert(key, value)?;
        }
        txn.commit()?;
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(ENTRIES)?;
            table.remove(key)?;
        }
        txn.commit()?;
        Ok(())
    }

    fn write(&self, batch: WriteBatch) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(ENTRIES)?;
            for op in batch {
                match op {
                    BatchOp::Put { key, value } => {
                        table.insert(key.as_slice(), value.as_slice())?;
                    }
                    BatchOp::Delete { key } => {
                        table.remove(key.as_slice())?;
                    }
                }
            }
        }
        // Dropping an uncommitted transaction aborts it, so an error above
        // leaves the store untouched
        txn.commit()?;
        Ok(())
    }
}
