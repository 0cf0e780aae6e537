//! Get command implementation.

use super::with_handle;
use std::path::Path;

/// Reads the string stored under `key`.
pub fn read(
    path: &Path,
    auto_create: bool,
    key: &str,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    with_handle(path, auto_create, |handle| handle.get(key))
}

/// Runs the get command.
pub fn run(path: &Path, auto_create: bool, key: &str) -> Result<(), Box<dyn std::error::Error>> {
    match read(path, auto_create, key)? {
        Some(value) => println!("{value}"),
        None => return Err(format!("Key not found: {key}").into()),
    }
    Ok(())
}
