//! Error paths of a shared handle: engine failures and unencodable values.

use kvshare_core::{
    CborCodec, ConnectionRegistry, ConsumerId, CoreError, DatabaseHandle, InMemoryEngine,
    StorageEngine, StorageError,
};
use kvshare_storage::{StorageResult, WriteBatch};
use parking_lot::{const_mutex, Mutex};
use serde::{ser, Serialize, Serializer};
use std::collections::{BTreeSet, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::tempdir;

/// Directories whose engine writes fail.
static FAIL_WRITES: Mutex<BTreeSet<PathBuf>> = const_mutex(BTreeSet::new());
/// Directories whose engine reads fail.
static FAIL_READS: Mutex<BTreeSet<PathBuf>> = const_mutex(BTreeSet::new());

fn injected() -> StorageError {
    StorageError::Io(io::Error::other("injected failure"))
}

/// An in-memory engine whose reads or writes can be switched to fail.
struct FlakyEngine {
    dir: PathBuf,
    inner: InMemoryEngine,
}

impl FlakyEngine {
    fn check_write(&self) -> StorageResult<()> {
        if FAIL_WRITES.lock().contains(&self.dir) {
            return Err(injected());
        }
        Ok(())
    }

    fn check_read(&self) -> StorageResult<()> {
        if FAIL_READS.lock().contains(&self.dir) {
            return Err(injected());
        }
        Ok(())
    }
}

impl StorageEngine for FlakyEngine {
    fn open(dir: &Path, create_if_missing: bool) -> StorageResult<Self> {
        Ok(Self {
            dir: dir.to_path_buf(),
            inner: InMemoryEngine::open(dir, create_if_missing)?,
        })
    }

    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        self.check_read()?;
        self.inner.get(key)
    }

    fn multi_get(&self, keys: &[Vec<u8>]) -> StorageResult<Vec<Option<Vec<u8>>>> {
        self.check_read()?;
        self.inner.multi_get(keys)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.check_write()?;
        self.inner.put(key, value)
    }

    fn delete(&self, key: &[u8]) -> StorageResult<()> {
        self.check_write()?;
        self.inner.delete(key)
    }

    fn write(&self, batch: WriteBatch) -> StorageResult<()> {
        self.check_write()?;
        self.inner.write(batch)
    }
}

/// A value that encodes unless it is `Broken`.
enum Entry {
    Number(i32),
    Broken,
}

impl Serialize for Entry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(n) => n.serialize(serializer),
            Self::Broken => Err(ser::Error::custom("value refuses to encode")),
        }
    }
}

type FlakyHandle = DatabaseHandle<FlakyEngine, CborCodec>;

fn open_flaky(dir: &Path) -> (ConnectionRegistry<FlakyEngine, CborCodec>, Arc<FlakyHandle>) {
    let registry = ConnectionRegistry::default();
    let handle = registry.acquire(dir, true, ConsumerId::new()).unwrap();
    (registry, handle)
}

#[test]
fn write_failure_leaves_handle_usable() {
    let temp = tempdir().unwrap();
    let (_registry, handle) = open_flaky(temp.path());
    let dir = handle.directory().to_path_buf();

    FAIL_WRITES.lock().insert(dir.clone());
    let put = handle.put("k", "v");
    let delete = handle.delete("k");
    FAIL_WRITES.lock().remove(&dir);

    for result in [put, delete] {
        assert!(matches!(
            result,
            Err(CoreError::StorageWrite {
                source: StorageError::Io(_),
                ..
            })
        ));
    }
    assert!(handle.is_open());

    handle.put("k", "v").unwrap();
    assert_eq!(handle.get::<_, String>("k").unwrap().as_deref(), Some("v"));
}

#[test]
fn failed_batch_writes_nothing() {
    let temp = tempdir().unwrap();
    let (_registry, handle) = open_flaky(temp.path());
    let dir = handle.directory().to_path_buf();

    FAIL_WRITES.lock().insert(dir.clone());
    let result = handle.put_all([("a", 1_i32), ("b", 2)]);
    FAIL_WRITES.lock().remove(&dir);

    assert!(matches!(result, Err(CoreError::StorageWrite { .. })));
    assert!(handle.is_open());
    let found: HashMap<String, i32> = handle.get_many(["a", "b"].map(String::from)).unwrap();
    assert!(found.is_empty());

    handle.put_all([("a", 1_i32), ("b", 2)]).unwrap();
    assert_eq!(handle.get::<_, i32>("b").unwrap(), Some(2));
}

#[test]
fn read_failure_leaves_handle_usable() {
    let temp = tempdir().unwrap();
    let (_registry, handle) = open_flaky(temp.path());
    let dir = handle.directory().to_path_buf();
    handle.put("k", &7_i32).unwrap();

    FAIL_READS.lock().insert(dir.clone());
    let get = handle.get::<_, i32>("k").map(|_| ());
    let many = handle
        .get_many::<String, i32, _>(vec!["k".to_string()])
        .map(|_| ());
    FAIL_READS.lock().remove(&dir);

    for result in [get, many] {
        assert!(matches!(result, Err(CoreError::StorageRead { .. })));
    }
    assert!(handle.is_open());
    assert_eq!(handle.get::<_, i32>("k").unwrap(), Some(7));
}

#[test]
fn unencodable_entry_aborts_whole_batch() {
    let temp = tempdir().unwrap();
    let (_registry, handle) = open_flaky(temp.path());

    let result = handle.put_all([("a", Entry::Number(1)), ("b", Entry::Broken)]);
    assert!(matches!(result, Err(CoreError::Serialization(_))));

    assert!(handle.is_open());
    assert_eq!(handle.get::<_, i32>("a").unwrap(), None);
    assert_eq!(handle.get::<_, i32>("b").unwrap(), None);
}

#[test]
fn unencodable_value_is_serialization_error() {
    let temp = tempdir().unwrap();
    let (_registry, handle) = open_flaky(temp.path());

    let result = handle.put("k", &Entry::Broken);
    assert!(matches!(result, Err(CoreError::Serialization(_))));

    handle.put("k", &Entry::Number(3)).unwrap();
    assert_eq!(handle.get::<_, i32>("k").unwrap(), Some(3));
}
