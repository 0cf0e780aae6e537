//! Typed map adapter over a shared handle.

use crate::config::MapStoreConfig;
use crate::error::CoreResult;
use crate::handle::DatabaseHandle;
use crate::registry::{ConnectionRegistry, ConsumerId};
use kvshare_codec::{CborCodec, Codec};
use kvshare_storage::{RedbEngine, StorageEngine};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

/// A typed map persisted in a shared store directory.
///
/// Each `MapStore` is one consumer of the registry. Any number of map
/// stores, with different key and value types, can point at the same
/// directory and share its single connection. Keys written by different
/// maps live in the same key space.
///
/// A map store holds its handle until [`destroy`](Self::destroy) is called.
/// Dropping it without destroying it keeps the directory open for the life
/// of the registry.
///
/// # Example
///
/// ```no_run
/// use kvshare_core::{ConnectionRegistry, MapStore, MapStoreConfig};
/// use std::sync::Arc;
///
/// let registry = Arc::new(ConnectionRegistry::new());
/// let config = MapStoreConfig::new("/var/lib/app/store");
///
/// let names: MapStore<String, String> = MapStore::open(Arc::clone(&registry), &config)?;
/// let counts: MapStore<String, i32> = MapStore::open(Arc::clone(&registry), &config)?;
///
/// names.store(&"alice".to_string(), &"Alice".to_string())?;
/// counts.store(&"visits".to_string(), &10)?;
///
/// names.destroy()?;
/// counts.destroy()?; // last consumer, closes the store
/// # Ok::<(), kvshare_core::CoreError>(())
/// ```
pub struct MapStore<K, V, E: StorageEngine = RedbEngine, C: Codec + Clone = CborCodec> {
    registry: Arc<ConnectionRegistry<E, C>>,
    handle: Arc<DatabaseHandle<E, C>>,
    consumer: ConsumerId,
    _types: PhantomData<fn() -> (K, V)>,
}

impl<K, V, E: StorageEngine, C: Codec + Clone> fmt::Debug for MapStore<K, V, E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapStore")
            .field("directory", &self.handle.directory())
            .field("consumer", &self.consumer)
            .finish_non_exhaustive()
    }
}

impl<K, V, E, C> MapStore<K, V, E, C>
where
    K: Serialize,
    V: Serialize + DeserializeOwned,
    E: StorageEngine,
    C: Codec + Clone,
{
    /// Opens a map store on the directory named by `config`.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` or `StorageOpen` if the directory's handle
    /// cannot be opened.
    pub fn open(registry: Arc<ConnectionRegistry<E, C>>, config: &MapStoreConfig) -> CoreResult<Self> {
        let consumer = ConsumerId::new();
        let handle = registry.acquire(config.database_path(), config.auto_create, consumer)?;
        Ok(Self {
            registry,
            handle,
            consumer,
            _types: PhantomData,
        })
    }

    /// Opens a map store from string properties.
    ///
    /// See [`MapStoreConfig::from_properties`] for the recognized keys.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` for bad properties, otherwise as
    /// [`open`](Self::open).
    pub fn from_properties(
        registry: Arc<ConnectionRegistry<E, C>>,
        properties: &HashMap<String, String>,
    ) -> CoreResult<Self> {
        let config = MapStoreConfig::from_properties(properties)?;
        Self::open(registry, &config)
    }

    /// Returns this store's consumer identity.
    #[must_use]
    pub fn consumer_id(&self) -> ConsumerId {
        self.consumer
    }

    /// Returns the directory backing this store.
    #[must_use]
    pub fn directory(&self) -> &Path {
        self.handle.directory()
    }

    /// Stores `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` or `StorageWrite`.
    pub fn store(&self, key: &K, value: &V) -> CoreResult<()> {
        self.handle.put(key, value)
    }

    /// Stores every entry of `entries` in one atomic batch.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` or `StorageWrite`; on error nothing is
    /// written.
    pub fn store_all<'a, I>(&self, entries: I) -> CoreResult<()>
    where
        I: IntoIterator<Item = (&'a K, &'a V)>,
        K: 'a,
        V: 'a,
    {
        self.handle.put_all(entries)
    }

    /// Deletes `key`.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` or `StorageWrite`.
    pub fn delete(&self, key: &K) -> CoreResult<()> {
        self.handle.delete(key)
    }

    /// Deletes every key of `keys` in one atomic batch.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` or `StorageWrite`.
    pub fn delete_all<'a, I>(&self, keys: I) -> CoreResult<()>
    where
        I: IntoIterator<Item = &'a K>,
        K: 'a,
    {
        self.handle.delete_all(keys)
    }

    /// Loads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageRead`, or `Deserialization` if the stored bytes were
    /// written as another type.
    pub fn load(&self, key: &K) -> CoreResult<Option<V>> {
        self.handle.get(key)
    }

    /// Loads every present key of `keys`. Missing keys are left out.
    ///
    /// # Errors
    ///
    /// Returns `StorageRead` or `Deserialization`.
    pub fn load_all<I>(&self, keys: I) -> CoreResult<HashMap<K, V>>
    where
        I: IntoIterator<Item = K>,
        K: Eq + Hash,
    {
        self.handle.get_many(keys)
    }

    /// Key enumeration is not supported; always returns `None`.
    #[must_use]
    pub fn load_all_keys(&self) -> Option<Vec<K>> {
        None
    }

    /// Releases this store's hold on the directory.
    ///
    /// The connection closes when the last store on the directory is
    /// destroyed.
    ///
    /// # Errors
    ///
    /// Returns `UnknownConsumer` if the registry no longer tracks this store.
    pub fn destroy(self) -> CoreResult<()> {
        self.registry.release(self.handle.directory(), self.consumer)
    }
}
