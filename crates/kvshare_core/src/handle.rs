//! Typed handle over one storage engine connection.

use crate::dir;
use crate::error::{CoreError, CoreResult};
use kvshare_codec::{CborCodec, Codec};
use kvshare_storage::{RedbEngine, StorageEngine, StorageError, WriteBatch};
use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;
use std::path::{Path, PathBuf};

/// The one live connection to the store in a directory.
///
/// A handle wraps a [`StorageEngine`] and a [`Codec`]: every typed key and
/// value goes through the codec and every read or write is a single engine
/// call.
///
/// Handles are created and closed only by
/// [`ConnectionRegistry`](crate::ConnectionRegistry), which shares one
/// handle between every consumer of a directory.
///
/// # Lifecycle
///
/// A handle is open from construction until the registry closes it. After
/// that every operation fails with [`CoreError::HandleClosed`] without
/// touching the engine, and the handle never reopens.
///
/// # Thread Safety
///
/// Operations take `&self` and may run concurrently from many threads.
/// Closing waits for operations already in flight.
pub struct DatabaseHandle<E: StorageEngine = RedbEngine, C: Codec = CborCodec> {
    /// Absolute store directory.
    directory: PathBuf,
    /// The engine connection; `None` once closed.
    engine: RwLock<Option<E>>,
    /// Key and value codec.
    codec: C,
}

impl<E: StorageEngine, C: Codec> std::fmt::Debug for DatabaseHandle<E, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseHandle")
            .field("directory", &self.directory)
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}

impl<E: StorageEngine, C: Codec> DatabaseHandle<E, C> {
    /// Opens the store in `directory`.
    ///
    /// `directory` is expected to be normalized already.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory doesn't exist and `auto_create` is false
    ///   (`Configuration`)
    /// - The path is not a directory (`Configuration`)
    /// - The engine fails to open (`StorageOpen`)
    pub(crate) fn open(directory: &Path, auto_create: bool, codec: C) -> CoreResult<Self> {
        dir::prepare(directory, auto_create)?;

        let engine = E::open(directory, auto_create).map_err(|source| CoreError::StorageOpen {
            directory: directory.to_path_buf(),
            source,
        })?;

        tracing::info!(directory = %directory.display(), "connection to database opened");

        Ok(Self {
            directory: directory.to_path_buf(),
            engine: RwLock::new(Some(engine)),
            codec,
        })
    }

    /// Returns the directory this handle is rooted at.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Returns true until the handle is closed.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.engine.read().is_some()
    }

    /// Stores `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns `HandleClosed`, `Serialization` or `StorageWrite`.
    pub fn put<K, V>(&self, key: &K, value: &V) -> CoreResult<()>
    where
        K: Serialize + ?Sized,
        V: Serialize + ?Sized,
    {
        let engine = self.engine()?;
        let key = self.encode(key)?;
        let value = self.encode(value)?;
        engine
            .put(&key, &value)
            .map_err(|source| self.write_error(source))
    }

    /// Stores every entry in one atomic batch.
    ///
    /// Either all entries become visible or, on failure, none do.
    ///
    /// # Errors
    ///
    /// Returns `HandleClosed`, `Serialization` or `StorageWrite`. An
    /// encoding failure is reported before anything is written.
    pub fn put_all<K, V, I>(&self, entries: I) -> CoreResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Serialize,
        V: Serialize,
    {
        let engine = self.engine()?;
        let entries = entries.into_iter();
        let mut batch = WriteBatch::with_capacity(entries.size_hint().0);
        for (key, value) in entries {
            batch.put(self.encode(&key)?, self.encode(&value)?);
        }
        engine.write(batch).map_err(|source| self.write_error(source))
    }

    /// Reads the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key was never written or was deleted.
    ///
    /// # Errors
    ///
    /// Returns `HandleClosed`, `Serialization`, `StorageRead`, or
    /// `Deserialization` if the stored bytes are not a `V`.
    pub fn get<K, V>(&self, key: &K) -> CoreResult<Option<V>>
    where
        K: Serialize + ?Sized,
        V: DeserializeOwned,
    {
        let engine = self.engine()?;
        let key = self.encode(key)?;
        let bytes = engine.get(&key).map_err(|source| self.read_error(source))?;
        bytes.map(|bytes| self.decode(&bytes)).transpose()
    }

    /// Reads several keys with one engine call.
    ///
    /// The result maps each requested key that is present to its value.
    /// Missing keys are left out.
    ///
    /// # Errors
    ///
    /// Returns `HandleClosed`, `Serialization`, `StorageRead` or
    /// `Deserialization`.
    pub fn get_many<K, V, I>(&self, keys: I) -> CoreResult<HashMap<K, V>>
    where
        I: IntoIterator<Item = K>,
        K: Serialize + Eq + Hash,
        V: DeserializeOwned,
    {
        let engine = self.engine()?;
        let keys: Vec<K> = keys.into_iter().collect();
        let encoded = keys
            .iter()
            .map(|key| self.encode(key))
            .collect::<CoreResult<Vec<_>>>()?;

        let found = engine
            .multi_get(&encoded)
            .map_err(|source| self.read_error(source))?;

        let mut result = HashMap::with_capacity(found.len());
        for (key, bytes) in keys.into_iter().zip(found) {
            if let Some(bytes) = bytes {
                result.insert(key, self.decode(&bytes)?);
            }
        }
        Ok(result)
    }

    /// Deletes `key`. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns `HandleClosed`, `Serialization` or `StorageWrite`.
    pub fn delete<K>(&self, key: &K) -> CoreResult<()>
    where
        K: Serialize + ?Sized,
    {
        let engine = self.engine()?;
        let key = self.encode(key)?;
        engine.delete(&key).map_err(|source| self.write_error(source))
    }

    /// Deletes every key in one atomic batch.
    ///
    /// # Errors
    ///
    /// Returns `HandleClosed`, `Serialization` or `StorageWrite`.
    pub fn delete_all<K, I>(&self, keys: I) -> CoreResult<()>
    where
        I: IntoIterator<Item = K>,
        K: Serialize,
    {
        let engine = self.engine()?;
        let mut batch = WriteBatch::new();
        for key in keys {
            batch.delete(self.encode(&key)?);
        }
        engine.write(batch).map_err(|source| self.write_error(source))
    }

    /// Closes the handle and releases the engine connection.
    ///
    /// Returns false if the handle was already closed.
    pub(crate) fn close(&self) -> bool {
        let mut engine = self.engine.write();
        match engine.take() {
            Some(connection) => {
                tracing::info!(directory = %self.directory.display(), "closing connection to database");
                drop(connection);
                true
            }
            None => false,
        }
    }

    fn engine(&self) -> CoreResult<MappedRwLockReadGuard<'_, E>> {
        RwLockReadGuard::try_map(self.engine.read(), Option::as_ref).map_err(|_| {
            CoreError::HandleClosed {
                directory: self.directory.clone(),
            }
        })
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> CoreResult<Vec<u8>> {
        self.codec.encode(value).map_err(CoreError::Serialization)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> CoreResult<T> {
        self.codec.decode(bytes).map_err(CoreError::Deserialization)
    }

    fn read_error(&self, source: StorageError) -> CoreError {
        CoreError::StorageRead {
            directory: self.directory.clone(),
            source,
        }
    }

    fn write_error(&self, source: StorageError) -> CoreError {
        CoreError::StorageWrite {
            directory: self.directory.clone(),
            source,
        }
    }
}
