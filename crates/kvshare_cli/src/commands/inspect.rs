//! Inspect command implementation.

use kvshare_core::{ConnectionRegistry, ConsumerId, CoreError, StorageError};
use kvshare_storage::{DATA_FILE, LOCK_FILE};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Store inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Store directory.
    pub path: String,
    /// Data file size in bytes.
    pub data_size: u64,
    /// Whether a lock file exists.
    pub lock_present: bool,
    /// Whether another connection currently holds the store.
    pub in_use: bool,
}

/// Gathers inspection details for the store at `path`.
///
/// Never creates anything. The store is briefly opened to probe its lock;
/// the open writes no transactions, though redb may refresh its own file
/// header.
pub fn inspect(path: &Path) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let data_path = path.join(DATA_FILE);
    if !data_path.exists() {
        return Err(format!("No store found at {}", path.display()).into());
    }

    let data_size = fs::metadata(&data_path)?.len();
    let lock_present = path.join(LOCK_FILE).exists();

    let registry = ConnectionRegistry::new();
    let consumer = ConsumerId::new();
    let in_use = match registry.acquire(path, false, consumer) {
        Ok(_) => {
            registry.release(path, consumer)?;
            false
        }
        Err(CoreError::StorageOpen {
            source: StorageError::Locked { .. },
            ..
        }) => true,
        Err(err) => return Err(err.into()),
    };

    Ok(InspectResult {
        path: path.display().to_string(),
        data_size,
        lock_present,
        in_use,
    })
}

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let result = inspect(path)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("KVShare Store Inspection");
    println!("========================");
    println!();
    println!("Path: {}", result.path);
    println!();
    println!("Files:");
    println!("  {DATA_FILE}:  {}", format_size(result.data_size));
    println!(
        "  {LOCK_FILE}:       {}",
        if result.lock_present { "present" } else { "absent" }
    );
    println!();
    println!("In use: {}", if result.in_use { "yes" } else { "no" });
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} bytes")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::put;
    use kvshare_storage::{RedbEngine, StorageEngine};
    use tempfile::tempdir;

    #[test]
    fn inspect_reports_files() {
        let temp = tempdir().unwrap();
        put::run(temp.path(), true, "k", "v").unwrap();

        let result = inspect(temp.path()).unwrap();
        assert!(result.data_size > 0);
        assert!(result.lock_present);
        assert!(!result.in_use);
    }

    #[test]
    fn inspect_detects_held_lock() {
        let temp = tempdir().unwrap();
        let _engine = RedbEngine::open(temp.path(), true).unwrap();

        let result = inspect(temp.path()).unwrap();
        assert!(result.in_use);
    }

    #[test]
    fn inspect_missing_store_fails() {
        let temp = tempdir().unwrap();
        assert!(inspect(temp.path()).is_err());
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
