//! Put command implementation.

use super::with_handle;
use std::path::Path;
use tracing::info;

/// Runs the put command.
pub fn run(
    path: &Path,
    auto_create: bool,
    key: &str,
    value: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    with_handle(path, auto_create, |handle| handle.put(key, value))?;
    info!(key = %key, "stored value");
    println!("✓ Stored {key}");
    Ok(())
}
