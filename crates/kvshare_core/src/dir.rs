//! Store directory checks and path normalization.

use crate::error::{CoreError, CoreResult};
use kvshare_storage::StorageError;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Turns `path` into the absolute, lexically normalized form used as a
/// registry key.
///
/// `.` components are dropped and `..` pops the previous component.
/// Symlinks are not resolved, since the directory may not exist yet.
pub(crate) fn normalize(path: &Path) -> CoreResult<PathBuf> {
    let absolute = std::path::absolute(path).map_err(|e| {
        CoreError::configuration(format!("invalid store path {}: {e}", path.display()))
    })?;

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    Ok(normalized)
}

/// Makes sure `path` is a usable store directory.
///
/// # Errors
///
/// Returns an error if:
/// - The directory doesn't exist and `create_if_missing` is false
///   (`Configuration`)
/// - The path exists but is not a directory (`Configuration`)
/// - Creating the directory fails (`StorageOpen`)
pub(crate) fn prepare(path: &Path, create_if_missing: bool) -> CoreResult<()> {
    if !path.exists() {
        if !create_if_missing {
            return Err(CoreError::configuration(format!(
                "directory {} does not exist and auto-creation is disabled",
                path.display()
            )));
        }
        fs::create_dir_all(path).map_err(|e| CoreError::StorageOpen {
            directory: path.to_path_buf(),
            source: StorageError::Io(e),
        })?;
    }

    if !path.is_dir() {
        return Err(CoreError::configuration(format!(
            "store path {} is not a directory",
            path.display()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn normalize_makes_relative_paths_absolute() {
        let normalized = normalize(Path::new("some/store")).unwrap();
        assert!(normalized.is_absolute());
        assert!(normalized.ends_with("some/store"));
    }

    #[test]
    fn normalize_collapses_dot_components() {
        let temp = tempdir().unwrap();
        let plain = temp.path().join("store");
        let dotted = temp.path().join("x").join("..").join(".").join("store");

        assert_eq!(normalize(&plain).unwrap(), normalize(&dotted).unwrap());
    }

    #[test]
    fn normalize_rejects_empty_path() {
        let result = normalize(Path::new(""));
        assert!(matches!(result, Err(CoreError::Configuration { .. })));
    }

    #[test]
    fn prepare_creates_nested_directories() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("a").join("b").join("store");

        prepare(&path, true).unwrap();
        assert!(path.is_dir());
    }

    #[test]
    fn prepare_fails_if_missing_and_no_create() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("missing");

        let result = prepare(&path, false);
        assert!(matches!(result, Err(CoreError::Configuration { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn prepare_fails_for_plain_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("file");
        fs::write(&path, b"not a directory").unwrap();

        for create in [true, false] {
            let result = prepare(&path, create);
            assert!(matches!(result, Err(CoreError::Configuration { .. })));
        }
    }

    #[test]
    fn prepare_accepts_existing_directory() {
        let temp = tempdir().unwrap();
        prepare(temp.path(), false).unwrap();
    }
}
