//! Shared, reference-counted handles keyed by directory.
//!
//! Several logical maps may back onto the same physical directory, but the
//! engine allows only one connection per directory. The registry opens that
//! connection on the first [`acquire`](ConnectionRegistry::acquire), hands
//! the same [`DatabaseHandle`] to every later consumer, and closes it when
//! the last consumer calls [`release`](ConnectionRegistry::release).
//!
//! ## Locking
//!
//! ```text
//! slots: Mutex<HashMap<path, Arc<Mutex<Slot>>>>
//!                                  │
//!                                  └─ Slot { live: Option<(handle, consumers)>, retired }
//! ```
//!
//! The outer map lock is only held to find or remove a slot. Opening and
//! closing a handle happen under the slot lock alone, so slow I/O in one
//! directory never blocks another. Lock order is slot → map; no code path
//! waits for a slot while holding the map.
//!
//! A slot is retired in the same critical section that empties it (or that
//! fails to open it) and is removed from the map before the slot lock is
//! released. An `acquire` that raced and grabbed a retired slot retries with
//! a fresh one.

use crate::dir;
use crate::error::{CoreError, CoreResult};
use crate::handle::DatabaseHandle;
use kvshare_codec::{CborCodec, Codec};
use kvshare_storage::{RedbEngine, StorageEngine};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Opaque identity of a logical consumer of a handle.
///
/// Each consumer (for example one [`MapStore`](crate::MapStore)) keeps its
/// id for its whole lifetime and passes it to both `acquire` and `release`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConsumerId(Uuid);

impl ConsumerId {
    /// Creates a new random consumer id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ConsumerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A handle together with the consumers holding it.
struct LiveEntry<E: StorageEngine, C: Codec> {
    handle: Arc<DatabaseHandle<E, C>>,
    consumers: HashSet<ConsumerId>,
}

/// Per-directory registry state.
struct Slot<E: StorageEngine, C: Codec> {
    /// The open handle, if any.
    live: Option<LiveEntry<E, C>>,
    /// Set once the slot has been closed or failed to open; never reused.
    retired: bool,
}

impl<E: StorageEngine, C: Codec> Slot<E, C> {
    fn new() -> Self {
        Self {
            live: None,
            retired: false,
        }
    }
}

type SharedSlot<E, C> = Arc<Mutex<Slot<E, C>>>;

/// Process-wide authority mapping directories to shared handles.
///
/// Create one registry at startup and share it (usually through an `Arc`)
/// with every consumer. Independent registries do not know about each
/// other, so two registries opening the same directory will conflict on
/// the engine lock.
///
/// # Example
///
/// ```no_run
/// use kvshare_core::{ConnectionRegistry, ConsumerId};
///
/// let registry = ConnectionRegistry::new();
/// let orders = ConsumerId::new();
/// let users = ConsumerId::new();
///
/// let a = registry.acquire("/var/lib/app/store", true, orders)?;
/// let b = registry.acquire("/var/lib/app/store", true, users)?;
/// a.put("order:1", "pending")?;
/// assert_eq!(b.get::<_, String>("order:1")?.as_deref(), Some("pending"));
///
/// registry.release("/var/lib/app/store", orders)?;
/// registry.release("/var/lib/app/store", users)?; // closes the handle
/// # Ok::<(), kvshare_core::CoreError>(())
/// ```
pub struct ConnectionRegistry<E: StorageEngine = RedbEngine, C: Codec + Clone = CborCodec> {
    slots: Mutex<HashMap<PathBuf, SharedSlot<E, C>>>,
    codec: C,
}

impl ConnectionRegistry {
    /// Creates an empty registry using [`RedbEngine`] and [`CborCodec`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: StorageEngine, C: Codec + Clone + Default> Default for ConnectionRegistry<E, C> {
    fn default() -> Self {
        Self::with_codec(C::default())
    }
}

impl<E: StorageEngine, C: Codec + Clone> fmt::Debug for ConnectionRegistry<E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("directories", &self.slots.lock().len())
            .finish_non_exhaustive()
    }
}

impl<E: StorageEngine, C: Codec + Clone> ConnectionRegistry<E, C> {
    /// Creates an empty registry whose handles use `codec`.
    #[must_use]
    pub fn with_codec(codec: C) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            codec,
        }
    }

    /// Returns the shared handle for `directory`, registering `consumer`.
    ///
    /// The first acquisition of a directory opens the handle, creating the
    /// directory when `auto_create` is true. Later acquisitions join the
    /// existing handle and ignore `auto_create`. Acquiring twice with the
    /// same consumer is a no-op apart from returning the handle.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` or `StorageOpen` if the handle cannot be
    /// opened. Nothing is registered in that case, and a later call may
    /// retry.
    pub fn acquire(
        &self,
        directory: impl AsRef<Path>,
        auto_create: bool,
        consumer: ConsumerId,
    ) -> CoreResult<Arc<DatabaseHandle<E, C>>> {
        let path = dir::normalize(directory.as_ref())?;

        loop {
            let slot = {
                let mut slots = self.slots.lock();
                Arc::clone(
                    slots
                        .entry(path.clone())
                        .or_insert_with(|| Arc::new(Mutex::new(Slot::new()))),
                )
            };

            let mut state = slot.lock();
            if state.retired {
                // Closed between our lookup and lock; it is already out of the map
                continue;
            }

            if let Some(live) = state.live.as_mut() {
                let joined = live.consumers.insert(consumer);
                tracing::debug!(
                    directory = %path.display(),
                    %consumer,
                    consumers = live.consumers.len(),
                    joined,
                    "joined shared handle"
                );
                return Ok(Arc::clone(&live.handle));
            }

            return match DatabaseHandle::<E, C>::open(&path, auto_create, self.codec.clone()) {
                Ok(handle) => {
                    let handle = Arc::new(handle);
                    state.live = Some(LiveEntry {
                        handle: Arc::clone(&handle),
                        consumers: HashSet::from([consumer]),
                    });
                    tracing::debug!(directory = %path.display(), %consumer, "registered new handle");
                    Ok(handle)
                }
                Err(err) => {
                    state.retired = true;
                    self.evict(&path, &slot);
                    tracing::warn!(directory = %path.display(), error = %err, "failed to open handle");
                    Err(err)
                }
            };
        }
    }

    /// Drops `consumer`'s hold on the handle for `directory`.
    ///
    /// When the last consumer is released the handle is closed and the
    /// directory is removed from the registry, all under the directory's
    /// lock.
    ///
    /// # Errors
    ///
    /// Returns `UnknownConsumer` if `consumer` does not currently hold the
    /// directory, including when the directory is not registered at all.
    pub fn release(&self, directory: impl AsRef<Path>, consumer: ConsumerId) -> CoreResult<()> {
        // A path that cannot be normalized was never acquired
        let Ok(path) = dir::normalize(directory.as_ref()) else {
            return Err(CoreError::UnknownConsumer {
                directory: directory.as_ref().to_path_buf(),
                consumer,
            });
        };
        let unknown = || CoreError::UnknownConsumer {
            directory: path.clone(),
            consumer,
        };

        let Some(slot) = self.slots.lock().get(&path).cloned() else {
            return Err(unknown());
        };

        let mut state = slot.lock();
        let Some(live) = state.live.as_mut() else {
            return Err(unknown());
        };
        if !live.consumers.remove(&consumer) {
            return Err(unknown());
        }

        if !live.consumers.is_empty() {
            tracing::debug!(
                directory = %path.display(),
                %consumer,
                consumers = live.consumers.len(),
                "released shared handle"
            );
            return Ok(());
        }

        if let Some(last) = state.live.take() {
            last.handle.close();
        }
        state.retired = true;
        self.evict(&path, &slot);
        tracing::debug!(directory = %path.display(), %consumer, "released last consumer");
        Ok(())
    }

    /// Returns true if `directory` currently has an open, registered handle.
    #[must_use]
    pub fn is_registered(&self, directory: impl AsRef<Path>) -> bool {
        self.consumer_count(directory) > 0
    }

    /// Returns how many consumers hold the handle for `directory`.
    #[must_use]
    pub fn consumer_count(&self, directory: impl AsRef<Path>) -> usize {
        let Ok(path) = dir::normalize(directory.as_ref()) else {
            return 0;
        };
        let Some(slot) = self.slots.lock().get(&path).cloned() else {
            return 0;
        };
        let state = slot.lock();
        state.live.as_ref().map_or(0, |live| live.consumers.len())
    }

    /// Returns the directories with an open handle, sorted.
    #[must_use]
    pub fn open_directories(&self) -> Vec<PathBuf> {
        let slots: Vec<(PathBuf, SharedSlot<E, C>)> = self
            .slots
            .lock()
            .iter()
            .map(|(path, slot)| (path.clone(), Arc::clone(slot)))
            .collect();

        let mut open: Vec<PathBuf> = slots
            .into_iter()
            .filter(|(_, slot)| slot.lock().live.is_some())
            .map(|(path, _)| path)
            .collect();
        open.sort();
        open
    }

    /// Removes `slot` from the map if it is still the entry for `path`.
    ///
    /// Called with the slot lock held.
    fn evict(&self, path: &Path, slot: &SharedSlot<E, C>) {
        let mut slots = self.slots.lock();
        if slots
            .get(path)
            .is_some_and(|current| Arc::ptr_eq(current, slot))
        {
            slots.remove(path);
        }
    }
}
