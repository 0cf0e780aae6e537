//! Delete command implementation.

use super::with_handle;
use std::path::Path;
use tracing::info;

/// Runs the delete command. Deleting a missing key succeeds.
pub fn run(path: &Path, auto_create: bool, key: &str) -> Result<(), Box<dyn std::error::Error>> {
    with_handle(path, auto_create, |handle| handle.delete(key))?;
    info!(key = %key, "deleted key");
    println!("✓ Deleted {key}");
    Ok(())
}
