//! Per-directory attribute records.
//!
//! Every attribute lives in its own file under a hidden `.attributes`
//! directory, so each record can be read or replaced without touching the
//! others:
//!
//! ```text
//! <entity>/.attributes/id        "0189c3e2-..."
//! <entity>/.attributes/name      "voltage"
//! <entity>/.attributes/created   "2024-05-01T10:00:00Z"
//! ```
//!
//! Values are JSON documents, which keeps records typed (strings, numbers,
//! lists, timestamps through serde) while remaining human-readable.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use dirstore_types::FileMode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{DirError, DirResult};
use crate::keys::validate_key;

/// Name of the hidden directory holding attribute records.
pub const ATTRIBUTE_DIR: &str = ".attributes";

/// Typed key/value records scoped to one directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeStore {
    location: PathBuf,
    mode: FileMode,
}

impl AttributeStore {
    pub fn new(location: impl Into<PathBuf>, mode: FileMode) -> Self {
        Self {
            location: location.into(),
            mode,
        }
    }

    /// The directory these attributes belong to.
    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn mode(&self) -> FileMode {
        self.mode
    }

    /// Returns `true` if a record for `key` exists.
    pub fn has_attr(&self, key: &str) -> DirResult<bool> {
        let path = self.record_path(key)?;
        match fs::metadata(&path) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if is_missing(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Read and decode the record for `key`.
    ///
    /// Returns `Ok(None)` if the record does not exist, including when the
    /// owning directory itself is gone (a dangling link, for instance).
    pub fn get_attr<T: DeserializeOwned>(&self, key: &str) -> DirResult<Option<T>> {
        let path = self.record_path(key)?;
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if is_missing(&e) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let value = serde_json::from_str(&raw)
            .map_err(|e| DirError::Serialization(format!("{}: {e}", path.display())))?;
        Ok(Some(value))
    }

    /// Encode and write the record for `key`, replacing any previous value.
    pub fn set_attr<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> DirResult<()> {
        self.require_writable()?;
        let path = self.record_path(key)?;
        let encoded =
            serde_json::to_string(value).map_err(|e| DirError::Serialization(e.to_string()))?;

        fs::create_dir_all(self.location.join(ATTRIBUTE_DIR))?;
        fs::write(&path, encoded)?;

        debug!(location = %self.location.display(), key, "attribute written");
        Ok(())
    }

    /// Delete the record for `key`. Returns `true` if it existed.
    pub fn remove_attr(&self, key: &str) -> DirResult<bool> {
        self.require_writable()?;
        let path = self.record_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(location = %self.location.display(), key, "attribute removed");
                Ok(true)
            }
            Err(e) if is_missing(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// All record keys, sorted.
    pub fn attr_keys(&self) -> DirResult<Vec<String>> {
        let dir = self.location.join(ATTRIBUTE_DIR);
        let iter = match fs::read_dir(&dir) {
            Ok(iter) => iter,
            Err(e) if is_missing(&e) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        for entry in iter {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                if validate_key(name).is_ok() && entry.file_type()?.is_file() {
                    keys.push(name.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn record_path(&self, key: &str) -> DirResult<PathBuf> {
        validate_key(key)?;
        Ok(self.location.join(ATTRIBUTE_DIR).join(key))
    }

    fn require_writable(&self) -> DirResult<()> {
        if self.mode.is_writable() {
            Ok(())
        } else {
            Err(DirError::ReadOnly)
        }
    }
}

pub(crate) fn is_missing(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &tempfile::TempDir) -> AttributeStore {
        AttributeStore::new(dir.path(), FileMode::ReadWrite)
    }

    #[test]
    fn set_and_get_string() {
        let dir = tempfile::tempdir().unwrap();
        let attrs = store(&dir);

        attrs.set_attr("name", "voltage").unwrap();
        let name: Option<String> = attrs.get_attr("name").unwrap();
        assert_eq!(name.as_deref(), Some("voltage"));
        assert!(dir.path().join(ATTRIBUTE_DIR).join("name").is_file());
    }

    #[test]
    fn typed_values_survive() {
        let dir = tempfile::tempdir().unwrap();
        let attrs = store(&dir);

        attrs.set_attr("position", &vec![1.5f64, 2.0]).unwrap();
        attrs.set_attr("count", &42u64).unwrap();

        let position: Vec<f64> = attrs.get_attr("position").unwrap().unwrap();
        assert_eq!(position, vec![1.5, 2.0]);
        let count: u64 = attrs.get_attr("count").unwrap().unwrap();
        assert_eq!(count, 42);
    }

    #[test]
    fn missing_attribute_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let attrs = store(&dir);
        let value: Option<String> = attrs.get_attr("absent").unwrap();
        assert!(value.is_none());
        assert!(!attrs.has_attr("absent").unwrap());
    }

    #[test]
    fn missing_location_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let attrs = AttributeStore::new(dir.path().join("gone"), FileMode::ReadWrite);
        let value: Option<String> = attrs.get_attr("name").unwrap();
        assert!(value.is_none());
        assert!(attrs.attr_keys().unwrap().is_empty());
    }

    #[test]
    fn wrong_type_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let attrs = store(&dir);
        attrs.set_attr("name", "text").unwrap();
        let err = attrs.get_attr::<u64>("name").unwrap_err();
        assert!(matches!(err, DirError::Serialization(_)));
    }

    #[test]
    fn overwrite_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let attrs = store(&dir);

        attrs.set_attr("unit", "mV").unwrap();
        attrs.set_attr("unit", "V").unwrap();
        assert_eq!(attrs.get_attr::<String>("unit").unwrap().as_deref(), Some("V"));

        assert!(attrs.remove_attr("unit").unwrap());
        assert!(!attrs.remove_attr("unit").unwrap());
        assert!(!attrs.has_attr("unit").unwrap());
    }

    #[test]
    fn keys_are_listed_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let attrs = store(&dir);
        attrs.set_attr("type", "Tag").unwrap();
        attrs.set_attr("id", "t1").unwrap();
        attrs.set_attr("name", "spike").unwrap();
        assert_eq!(attrs.attr_keys().unwrap(), vec!["id", "name", "type"]);
    }

    #[test]
    fn read_only_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        let attrs = AttributeStore::new(dir.path(), FileMode::ReadOnly);
        assert!(matches!(attrs.set_attr("name", "x"), Err(DirError::ReadOnly)));
        assert!(matches!(attrs.remove_attr("name"), Err(DirError::ReadOnly)));
        assert!(!dir.path().join(ATTRIBUTE_DIR).exists());
    }

    #[test]
    fn invalid_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let attrs = store(&dir);
        assert!(matches!(
            attrs.set_attr("../escape", "x"),
            Err(DirError::InvalidKey { .. })
        ));
    }
}
