//! Map store configuration.

use crate::error::{CoreError, CoreResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Property naming the store directory. Required.
pub const DATABASE_PATH_PROPERTY: &str = "kvshare.database.path";

/// Property controlling directory auto-creation. Optional, `true` or `false`.
pub const DATABASE_AUTOCREATE_PROPERTY: &str = "kvshare.database.autocreate";

/// Auto-creation is on unless disabled.
pub const DEFAULT_AUTO_CREATE: bool = true;

/// Configuration for opening a [`MapStore`](crate::MapStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapStoreConfig {
    /// Directory holding the store.
    pub database_path: PathBuf,

    /// Whether to create the directory if it doesn't exist.
    ///
    /// Only honored by the first consumer to open the directory.
    pub auto_create: bool,
}

impl MapStoreConfig {
    /// Creates a configuration for `database_path` with default options.
    #[must_use]
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            auto_create: DEFAULT_AUTO_CREATE,
        }
    }

    /// Sets whether to create the directory if missing.
    #[must_use]
    pub const fn auto_create(mut self, value: bool) -> Self {
        self.auto_create = value;
        self
    }

    /// Returns the store directory.
    #[must_use]
    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    /// Reads a configuration from string properties.
    ///
    /// Unrelated properties are ignored.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if [`DATABASE_PATH_PROPERTY`] is missing or
    /// blank, or if [`DATABASE_AUTOCREATE_PROPERTY`] is neither `true` nor
    /// `false`.
    pub fn from_properties(properties: &HashMap<String, String>) -> CoreResult<Self> {
        let path = properties
            .get(DATABASE_PATH_PROPERTY)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                CoreError::configuration(format!("missing property {DATABASE_PATH_PROPERTY}"))
            })?;

        let auto_create = match properties.get(DATABASE_AUTOCREATE_PROPERTY) {
            None => DEFAULT_AUTO_CREATE,
            Some(value) => parse_bool(value).ok_or_else(|| {
                CoreError::configuration(format!(
                    "property {DATABASE_AUTOCREATE_PROPERTY} must be true or false, got {value:?}"
                ))
            })?,
        };

        Ok(Self::new(path).auto_create(auto_create))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn new_config_auto_creates() {
        let config = MapStoreConfig::new("/tmp/store");
        assert!(config.auto_create);
        assert_eq!(config.database_path(), Path::new("/tmp/store"));
    }

    #[test]
    fn builder_pattern() {
        let config = MapStoreConfig::new("store").auto_create(false);
        assert!(!config.auto_create);
    }

    #[test]
    fn from_properties_defaults_auto_create() {
        let config =
            MapStoreConfig::from_properties(&props(&[(DATABASE_PATH_PROPERTY, "data/db")]))
                .unwrap();
        assert_eq!(config, MapStoreConfig::new("data/db"));
    }

    #[test]
    fn from_properties_reads_auto_create() {
        for (raw, expected) in [("false", false), ("TRUE", true), (" False ", false)] {
            let config = MapStoreConfig::from_properties(&props(&[
                (DATABASE_PATH_PROPERTY, "data/db"),
                (DATABASE_AUTOCREATE_PROPERTY, raw),
            ]))
            .unwrap();
            assert_eq!(config.auto_create, expected, "input {raw:?}");
        }
    }

    #[test]
    fn from_properties_requires_path() {
        for properties in [
            props(&[]),
            props(&[(DATABASE_PATH_PROPERTY, "   ")]),
            props(&[("unrelated", "x")]),
        ] {
            let result = MapStoreConfig::from_properties(&properties);
            assert!(matches!(result, Err(CoreError::Configuration { .. })));
        }
    }

    #[test]
    fn from_properties_rejects_bad_bool() {
        for raw in ["yes", "1", ""] {
            let result = MapStoreConfig::from_properties(&props(&[
                (DATABASE_PATH_PROPERTY, "data/db"),
                (DATABASE_AUTOCREATE_PROPERTY, raw),
            ]));
            assert!(matches!(result, Err(CoreError::Configuration { .. })));
        }
    }
}
