//! The persisted entity: one directory holding attribute records.
//!
//! Every entity directory carries at least these records:
//!
//! | key       | value                                   |
//! |-----------|-----------------------------------------|
//! | `id`      | opaque id, equal to the directory name  |
//! | `type`    | [`ObjectType`] of the entity            |
//! | `name`    | caller-chosen name                      |
//! | `created` | creation timestamp (RFC 3339)           |
//! | `updated` | last modification timestamp (RFC 3339)  |
//!
//! plus the optional `kind` and `definition` strings and any number of
//! free-form attributes.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use dirstore_directory::{DirOptions, Directory, ID_KEY, NAME_KEY};
use dirstore_types::{FileMode, Identity, ObjectType};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{FsError, FsResult};

pub const TYPE_KEY: &str = "type";
pub const KIND_KEY: &str = "kind";
pub const DEFINITION_KEY: &str = "definition";
pub const CREATED_KEY: &str = "created";
pub const UPDATED_KEY: &str = "updated";

pub(crate) const LABEL_KEY: &str = "label";
pub(crate) const UNIT_KEY: &str = "unit";
pub(crate) const UNITS_KEY: &str = "units";
pub(crate) const POSITION_KEY: &str = "position";
pub(crate) const EXTENT_KEY: &str = "extent";
pub(crate) const LINK_TYPE_KEY: &str = "link_type";

/// Records that only the entity layer itself may write.
const RESERVED_KEYS: &[&str] = &[
    ID_KEY,
    TYPE_KEY,
    NAME_KEY,
    KIND_KEY,
    DEFINITION_KEY,
    CREATED_KEY,
    UPDATED_KEY,
    LABEL_KEY,
    UNIT_KEY,
    UNITS_KEY,
    POSITION_KEY,
    EXTENT_KEY,
    LINK_TYPE_KEY,
];

/// Handle to one persisted entity.
///
/// The handle is a path plus the entity's id, read once on open since ids
/// are immutable. Everything else is read from disk on every call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityFs {
    dir: Directory,
    id: String,
}

impl EntityFs {
    /// Write a new entity's records at `location`, stamped with the current
    /// time.
    pub fn create(
        location: impl Into<PathBuf>,
        id: &str,
        object_type: ObjectType,
        name: &str,
        kind: &str,
        options: DirOptions,
    ) -> FsResult<Self> {
        Self::create_at(location, id, object_type, name, kind, Utc::now(), options)
    }

    /// Like [`create`](Self::create) with an explicit creation time.
    pub fn create_at(
        location: impl Into<PathBuf>,
        id: &str,
        object_type: ObjectType,
        name: &str,
        kind: &str,
        time: DateTime<Utc>,
        options: DirOptions,
    ) -> FsResult<Self> {
        if name.is_empty() {
            return Err(FsError::EmptyName(object_type));
        }
        let dir = Directory::open(location, options)?;
        dir.set_attr(ID_KEY, id)?;
        dir.set_attr(TYPE_KEY, &object_type)?;
        dir.set_attr(NAME_KEY, name)?;
        dir.set_attr(KIND_KEY, kind)?;
        dir.set_attr(CREATED_KEY, &time)?;
        dir.set_attr(UPDATED_KEY, &time)?;
        Ok(Self {
            dir,
            id: id.to_string(),
        })
    }

    /// Open an existing entity. Fails with [`FsError::MissingAttribute`] if
    /// the location carries no `id` record.
    pub fn open(location: impl Into<PathBuf>, options: DirOptions) -> FsResult<Self> {
        let location = location.into();
        let dir = Directory::open(&location, DirOptions { mode: FileMode::ReadOnly, ..options })?;
        let id: String = dir.get_attr(ID_KEY)?.ok_or_else(|| FsError::MissingAttribute {
            location: location.clone(),
            key: ID_KEY.to_string(),
        })?;
        let dir = Directory::open(location, options)?;
        Ok(Self { dir, id })
    }

    /// Open and check that the stored type is `expected`.
    pub fn open_typed(
        location: impl Into<PathBuf>,
        expected: ObjectType,
        options: DirOptions,
    ) -> FsResult<Self> {
        let entity = Self::open(location, options)?;
        let actual = entity.object_type()?;
        if actual != expected {
            return Err(FsError::TypeMismatch { expected, actual });
        }
        Ok(entity)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn location(&self) -> &Path {
        self.dir.location()
    }

    pub fn directory(&self) -> &Directory {
        &self.dir
    }

    pub fn options(&self) -> DirOptions {
        self.dir.options()
    }

    pub fn object_type(&self) -> FsResult<ObjectType> {
        self.required(TYPE_KEY)
    }

    pub fn name(&self) -> FsResult<Option<String>> {
        Ok(self.dir.get_attr(NAME_KEY)?)
    }

    pub fn set_name(&self, name: &str) -> FsResult<()> {
        if name.is_empty() {
            return Err(FsError::EmptyName(self.object_type()?));
        }
        self.dir.set_attr(NAME_KEY, name)?;
        self.touch()
    }

    /// Free-form user type, e.g. `"nix.session"`.
    pub fn kind(&self) -> FsResult<Option<String>> {
        Ok(self.dir.get_attr(KIND_KEY)?)
    }

    pub fn set_kind(&self, kind: &str) -> FsResult<()> {
        self.dir.set_attr(KIND_KEY, kind)?;
        self.touch()
    }

    pub fn definition(&self) -> FsResult<Option<String>> {
        Ok(self.dir.get_attr(DEFINITION_KEY)?)
    }

    /// Set the definition text; `None` removes it.
    pub fn set_definition(&self, definition: Option<&str>) -> FsResult<()> {
        match definition {
            Some(text) => self.dir.set_attr(DEFINITION_KEY, text)?,
            None => {
                self.dir.attributes().remove_attr(DEFINITION_KEY)?;
            }
        }
        self.touch()
    }

    pub fn created_at(&self) -> FsResult<DateTime<Utc>> {
        self.required(CREATED_KEY)
    }

    pub fn updated_at(&self) -> FsResult<DateTime<Utc>> {
        self.required(UPDATED_KEY)
    }

    /// Overwrite the creation timestamp.
    pub fn force_created_at(&self, time: DateTime<Utc>) -> FsResult<()> {
        Ok(self.dir.set_attr(CREATED_KEY, &time)?)
    }

    /// Overwrite the modification timestamp.
    pub fn force_updated_at(&self, time: DateTime<Utc>) -> FsResult<()> {
        Ok(self.dir.set_attr(UPDATED_KEY, &time)?)
    }

    /// Stamp the entity as modified now.
    pub fn touch(&self) -> FsResult<()> {
        self.force_updated_at(Utc::now())
    }

    /// Identity carrying this entity's id, current name, and type.
    pub fn identity(&self) -> FsResult<Identity> {
        Ok(Identity::new(
            self.id.clone(),
            self.name()?.unwrap_or_default(),
            self.object_type()?,
        ))
    }

    /// Read a free-form attribute.
    pub fn get_attr<T: DeserializeOwned>(&self, key: &str) -> FsResult<Option<T>> {
        Ok(self.dir.get_attr(key)?)
    }

    /// Write a free-form attribute. Structural records are rejected.
    pub fn set_attr<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> FsResult<()> {
        reject_reserved(key)?;
        self.dir.set_attr(key, value)?;
        self.touch()
    }

    pub fn has_attr(&self, key: &str) -> FsResult<bool> {
        Ok(self.dir.attributes().has_attr(key)?)
    }

    /// Remove a free-form attribute. Returns `true` if it existed.
    pub fn remove_attr(&self, key: &str) -> FsResult<bool> {
        reject_reserved(key)?;
        let removed = self.dir.attributes().remove_attr(key)?;
        if removed {
            self.touch()?;
        }
        Ok(removed)
    }

    /// Keys of free-form attributes, sorted.
    pub fn attr_keys(&self) -> FsResult<Vec<String>> {
        Ok(self
            .dir
            .attributes()
            .attr_keys()?
            .into_iter()
            .filter(|k| !RESERVED_KEYS.contains(&k.as_str()))
            .collect())
    }

    /// Open (creating if writable) a collection directory inside this entity.
    pub fn sub_directory(&self, name: &str) -> FsResult<Directory> {
        Ok(Directory::open(self.location().join(name), self.options())?)
    }

    pub(crate) fn set_structural<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> FsResult<()> {
        self.dir.set_attr(key, value)?;
        self.touch()
    }

    pub(crate) fn remove_structural(&self, key: &str) -> FsResult<bool> {
        let removed = self.dir.attributes().remove_attr(key)?;
        if removed {
            self.touch()?;
        }
        Ok(removed)
    }

    fn required<T: DeserializeOwned>(&self, key: &str) -> FsResult<T> {
        self.dir.get_attr(key)?.ok_or_else(|| FsError::MissingAttribute {
            location: self.location().to_path_buf(),
            key: key.to_string(),
        })
    }
}

fn reject_reserved(key: &str) -> FsResult<()> {
    if RESERVED_KEYS.contains(&key) {
        return Err(FsError::ReservedAttribute(key.to_string()));
    }
    Ok(())
}

/// Capabilities shared by every entity handle.
pub trait Entity {
    /// The underlying persisted entity.
    fn entity(&self) -> &EntityFs;

    /// The declared type of this handle.
    fn object_type(&self) -> ObjectType;

    fn id(&self) -> &str {
        self.entity().id()
    }

    fn location(&self) -> &Path {
        self.entity().location()
    }

    fn name(&self) -> FsResult<Option<String>> {
        self.entity().name()
    }

    /// Identity carrying this handle's id, current name, and type.
    fn identity(&self) -> FsResult<Identity> {
        Ok(Identity::new(
            self.id().to_string(),
            self.name()?.unwrap_or_default(),
            self.object_type(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn create(dir: &tempfile::TempDir) -> EntityFs {
        EntityFs::create(
            dir.path().join("e1"),
            "e1",
            ObjectType::DataArray,
            "voltage",
            "nix.sampled",
            DirOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn create_writes_required_records() {
        let dir = tempfile::tempdir().unwrap();
        let entity = create(&dir);

        assert_eq!(entity.id(), "e1");
        assert_eq!(entity.object_type().unwrap(), ObjectType::DataArray);
        assert_eq!(entity.name().unwrap().as_deref(), Some("voltage"));
        assert_eq!(entity.kind().unwrap().as_deref(), Some("nix.sampled"));
        assert_eq!(entity.created_at().unwrap(), entity.updated_at().unwrap());

        let records = dir.path().join("e1/.attributes");
        for key in ["id", "type", "name", "created", "updated"] {
            assert!(records.join(key).is_file(), "missing record {key}");
        }
    }

    #[test]
    fn open_reads_id() {
        let dir = tempfile::tempdir().unwrap();
        create(&dir);
        let opened = EntityFs::open(dir.path().join("e1"), DirOptions::default()).unwrap();
        assert_eq!(opened.id(), "e1");
    }

    #[test]
    fn open_without_id_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("bare")).unwrap();
        let err = EntityFs::open(dir.path().join("bare"), DirOptions::default()).unwrap_err();
        assert!(matches!(err, FsError::MissingAttribute { .. }));
    }

    #[test]
    fn open_missing_location_read_only_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let options = DirOptions::with_mode(FileMode::ReadOnly);
        let err = EntityFs::open(dir.path().join("absent"), options).unwrap_err();
        assert!(matches!(err, FsError::MissingAttribute { .. }));
        assert!(!dir.path().join("absent").exists());
    }

    #[test]
    fn open_typed_checks_type() {
        let dir = tempfile::tempdir().unwrap();
        create(&dir);
        let err = EntityFs::open_typed(dir.path().join("e1"), ObjectType::Tag, DirOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            FsError::TypeMismatch {
                expected: ObjectType::Tag,
                actual: ObjectType::DataArray
            }
        ));
    }

    #[test]
    fn setters_bump_updated() {
        let dir = tempfile::tempdir().unwrap();
        let entity = create(&dir);
        let past = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        entity.force_updated_at(past).unwrap();

        entity.set_name("current").unwrap();
        assert_eq!(entity.name().unwrap().as_deref(), Some("current"));
        assert!(entity.updated_at().unwrap() > past);
    }

    #[test]
    fn empty_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let entity = create(&dir);
        assert!(matches!(entity.set_name(""), Err(FsError::EmptyName(ObjectType::DataArray))));
        let err = EntityFs::create(
            dir.path().join("e2"),
            "e2",
            ObjectType::Tag,
            "",
            "",
            DirOptions::default(),
        )
        .unwrap_err();
        assert!(err.is_precondition());
    }

    #[test]
    fn definition_can_be_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let entity = create(&dir);
        entity.set_definition(Some("membrane potential")).unwrap();
        assert_eq!(entity.definition().unwrap().as_deref(), Some("membrane potential"));
        entity.set_definition(None).unwrap();
        assert!(entity.definition().unwrap().is_none());
    }

    #[test]
    fn free_form_attributes() {
        let dir = tempfile::tempdir().unwrap();
        let entity = create(&dir);

        entity.set_attr("sampling_rate", &20_000.0f64).unwrap();
        entity.set_attr("electrode", "E3").unwrap();
        assert_eq!(entity.get_attr::<f64>("sampling_rate").unwrap(), Some(20_000.0));
        assert!(entity.has_attr("electrode").unwrap());
        assert_eq!(entity.attr_keys().unwrap(), vec!["electrode", "sampling_rate"]);

        assert!(entity.remove_attr("electrode").unwrap());
        assert!(!entity.remove_attr("electrode").unwrap());
    }

    #[test]
    fn reserved_attributes_are_protected() {
        let dir = tempfile::tempdir().unwrap();
        let entity = create(&dir);
        assert!(matches!(entity.set_attr("id", "other"), Err(FsError::ReservedAttribute(_))));
        assert!(matches!(entity.remove_attr("created"), Err(FsError::ReservedAttribute(_))));
        assert_eq!(entity.id(), "e1");
    }

    #[test]
    fn read_only_handle_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        create(&dir);
        let options = DirOptions::with_mode(FileMode::ReadOnly);
        let entity = EntityFs::open(dir.path().join("e1"), options).unwrap();
        assert!(entity.set_name("x").is_err());
        assert_eq!(entity.name().unwrap().as_deref(), Some("voltage"));
    }

    #[test]
    fn identity_reflects_records() {
        let dir = tempfile::tempdir().unwrap();
        let entity = create(&dir);
        let ident = entity.identity().unwrap();
        assert_eq!(ident, Identity::new("e1", "voltage", ObjectType::DataArray));
    }
}
