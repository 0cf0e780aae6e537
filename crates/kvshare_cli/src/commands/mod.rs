//! CLI command implementations.

pub mod delete;
pub mod get;
pub mod inspect;
pub mod put;

use kvshare_core::{ConnectionRegistry, ConsumerId, CoreResult, DatabaseHandle};
use std::path::Path;

/// Runs `op` against the store at `path` as a single registry consumer.
///
/// The handle is released before returning, whether or not `op` succeeded.
pub fn with_handle<T>(
    path: &Path,
    auto_create: bool,
    op: impl FnOnce(&DatabaseHandle) -> CoreResult<T>,
) -> Result<T, Box<dyn std::error::Error>> {
    let registry = ConnectionRegistry::new();
    let consumer = ConsumerId::new();

    let handle = registry.acquire(path, auto_create, consumer)?;
    let result = op(&handle);
    registry.release(path, consumer)?;

    Ok(result?)
}
