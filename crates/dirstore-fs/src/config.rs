//! Store configuration, loaded from TOML or built in code.

use std::path::Path;

use dirstore_directory::DirOptions;
use dirstore_types::{FileMode, UuidGenerator};
use serde::{Deserialize, Serialize};

use crate::error::{FsError, FsResult};

/// Configuration for opening a store.
///
/// ```toml
/// mode = "read_write"
/// relative_links = true
/// id_prefix = "lab"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Whether the store may be mutated, and whether existing content is kept.
    pub mode: FileMode,
    /// Store link targets relative to the link's parent directory, so a
    /// store can be moved or copied as a whole.
    pub relative_links: bool,
    /// Prefix prepended to generated entity ids.
    pub id_prefix: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            mode: FileMode::ReadWrite,
            relative_links: true,
            id_prefix: None,
        }
    }
}

impl StoreConfig {
    pub fn read_only() -> Self {
        Self {
            mode: FileMode::ReadOnly,
            ..Default::default()
        }
    }

    pub fn overwrite() -> Self {
        Self {
            mode: FileMode::Overwrite,
            ..Default::default()
        }
    }

    /// Parse a configuration from a TOML document. Missing keys take their
    /// default values.
    pub fn from_toml_str(s: &str) -> FsResult<Self> {
        toml::from_str(s).map_err(|e| FsError::Config(e.to_string()))
    }

    /// Load a configuration from a TOML file.
    pub fn load(path: &Path) -> FsResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| FsError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    pub fn to_toml_string(&self) -> FsResult<String> {
        toml::to_string(self).map_err(|e| FsError::Config(e.to_string()))
    }

    pub fn dir_options(&self) -> DirOptions {
        DirOptions {
            mode: self.mode,
            relative_links: self.relative_links,
        }
    }

    /// The id generator described by this configuration.
    pub fn id_generator(&self) -> UuidGenerator {
        match &self.id_prefix {
            Some(prefix) => UuidGenerator::with_prefix(prefix.clone()),
            None => UuidGenerator::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dirstore_types::IdGenerator;

    #[test]
    fn default_config() {
        let c = StoreConfig::default();
        assert_eq!(c.mode, FileMode::ReadWrite);
        assert!(c.relative_links);
        assert!(c.id_prefix.is_none());
    }

    #[test]
    fn parse_full_document() {
        let c = StoreConfig::from_toml_str(
            r#"
            mode = "read_only"
            relative_links = false
            id_prefix = "lab"
            "#,
        )
        .unwrap();
        assert_eq!(c.mode, FileMode::ReadOnly);
        assert!(!c.relative_links);
        assert!(c.id_generator().create_id().starts_with("lab-"));
    }

    #[test]
    fn missing_keys_take_defaults() {
        let c = StoreConfig::from_toml_str("mode = \"overwrite\"").unwrap();
        assert_eq!(c.mode, FileMode::Overwrite);
        assert!(c.relative_links);
    }

    #[test]
    fn unknown_mode_is_config_error() {
        let err = StoreConfig::from_toml_str("mode = \"append\"").unwrap_err();
        assert!(matches!(err, FsError::Config(_)));
    }

    #[test]
    fn toml_roundtrip_via_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.toml");
        let config = StoreConfig {
            id_prefix: Some("x".into()),
            ..StoreConfig::read_only()
        };
        std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();
        assert_eq!(StoreConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn dir_options_follow_config() {
        let options = StoreConfig::read_only().dir_options();
        assert_eq!(options.mode, FileMode::ReadOnly);
        assert!(options.relative_links);
    }
}
