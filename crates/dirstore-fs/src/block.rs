//! Blocks: the owners of all entity storage.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use dirstore_directory::{DirOptions, ObjectEntry};
use dirstore_types::{IdGenerator, Identity, ObjectType};

use crate::entity::{Entity, EntityFs};
use crate::error::{FsError, FsResult};
use crate::handle::EntityHandle;
use crate::owned::OwnedCollection;

/// The owned collections of one block.
///
/// Every handle opened below a block keeps an `Arc` to this so relations
/// can be validated against, and resolved into, block-owned storage.
#[derive(Clone)]
pub struct BlockScope {
    block_id: String,
    sources: OwnedCollection,
    data_arrays: OwnedCollection,
    tags: OwnedCollection,
    multi_tags: OwnedCollection,
    groups: OwnedCollection,
}

impl BlockScope {
    fn open(block: &EntityFs, ids: Arc<dyn IdGenerator>) -> FsResult<Self> {
        let open = |ty: ObjectType| OwnedCollection::open(block.location(), ObjectType::Block, ty, block.options(), ids.clone());
        Ok(Self {
            block_id: block.id().to_string(),
            sources: open(ObjectType::Source)?,
            data_arrays: open(ObjectType::DataArray)?,
            tags: open(ObjectType::Tag)?,
            multi_tags: open(ObjectType::MultiTag)?,
            groups: open(ObjectType::Group)?,
        })
    }

    pub fn block_id(&self) -> &str {
        &self.block_id
    }

    /// The block's collection for `object_type`, if it keeps one.
    pub fn collection(&self, object_type: ObjectType) -> Option<&OwnedCollection> {
        match object_type {
            ObjectType::Source => Some(&self.sources),
            ObjectType::DataArray => Some(&self.data_arrays),
            ObjectType::Tag => Some(&self.tags),
            ObjectType::MultiTag => Some(&self.multi_tags),
            ObjectType::Group => Some(&self.groups),
            ObjectType::Block | ObjectType::Feature => None,
        }
    }

    pub fn options(&self) -> DirOptions {
        self.sources.options()
    }

    pub fn ids(&self) -> &Arc<dyn IdGenerator> {
        self.sources.ids()
    }
}

impl fmt::Debug for BlockScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockScope")
            .field("block_id", &self.block_id)
            .field("location", &self.sources.directory().location().parent())
            .finish()
    }
}

/// A block and the entities it owns.
///
/// Only a block creates and deletes entity storage. Deleting an entity does
/// not touch links to it held by groups, tags, or other entities; those
/// links dangle until removed explicitly.
#[derive(Clone, Debug)]
pub struct BlockFs {
    entity: EntityFs,
    scope: Arc<BlockScope>,
}

impl BlockFs {
    pub fn create(
        location: impl Into<PathBuf>,
        id: &str,
        name: &str,
        kind: &str,
        options: DirOptions,
        ids: Arc<dyn IdGenerator>,
    ) -> FsResult<Self> {
        let entity = EntityFs::create(location, id, ObjectType::Block, name, kind, options)?;
        Self::from_entity(entity, ids)
    }

    pub fn open(location: impl Into<PathBuf>, options: DirOptions, ids: Arc<dyn IdGenerator>) -> FsResult<Self> {
        let entity = EntityFs::open_typed(location, ObjectType::Block, options)?;
        Self::from_entity(entity, ids)
    }

    pub(crate) fn from_entity(entity: EntityFs, ids: Arc<dyn IdGenerator>) -> FsResult<Self> {
        let scope = Arc::new(BlockScope::open(&entity, ids)?);
        Ok(Self { entity, scope })
    }

    pub fn scope(&self) -> &Arc<BlockScope> {
        &self.scope
    }

    /// Returns `true` if the block owns an entity matching `ident`.
    pub fn has_entity(&self, ident: &Identity) -> FsResult<bool> {
        match self.scope.collection(ident.object_type()) {
            Some(coll) => coll.has(ident),
            None => Ok(false),
        }
    }

    pub fn get_entity(&self, ident: &Identity) -> FsResult<Option<EntityHandle>> {
        let Some(coll) = self.scope.collection(ident.object_type()) else {
            return Ok(None);
        };
        match coll.resolve(ident)? {
            Some(entry) => self.open_entry(ident.object_type(), entry).map(Some),
            None => Ok(None),
        }
    }

    /// The entity at `index` in the collection for `object_type`.
    pub fn get_entity_at(&self, object_type: ObjectType, index: u64) -> FsResult<Option<EntityHandle>> {
        let Some(coll) = self.scope.collection(object_type) else {
            return Ok(None);
        };
        let id = coll.entry_at(index)?.map(|e| e.id).unwrap_or_default();
        self.get_entity(&Identity::by_id(id, object_type))
    }

    pub fn entity_count(&self, object_type: ObjectType) -> FsResult<u64> {
        match self.scope.collection(object_type) {
            Some(coll) => coll.count(),
            None => Ok(0),
        }
    }

    pub fn entities(&self, object_type: ObjectType) -> FsResult<Vec<EntityHandle>> {
        let Some(coll) = self.scope.collection(object_type) else {
            return Ok(Vec::new());
        };
        coll.entries()?
            .into_iter()
            .map(|entry| self.open_entry(object_type, entry))
            .collect()
    }

    /// Create an entity of `object_type` with a generated id.
    pub fn create_entity(&self, object_type: ObjectType, name: &str, kind: &str) -> FsResult<EntityHandle> {
        let entity = self.owned(object_type)?.create(name, kind)?;
        EntityHandle::from_entity(object_type, entity, self.scope.clone())
    }

    /// Create an entity of `object_type` with a caller-chosen id.
    pub fn create_entity_with_id(
        &self,
        object_type: ObjectType,
        id: &str,
        name: &str,
        kind: &str,
    ) -> FsResult<EntityHandle> {
        let entity = self.owned(object_type)?.create_with_id(id, name, kind)?;
        EntityHandle::from_entity(object_type, entity, self.scope.clone())
    }

    /// Delete the entity `ident` resolves to, with all its storage.
    pub fn remove_entity(&self, ident: &Identity) -> FsResult<bool> {
        ident.require_key()?;
        self.owned(ident.object_type())?.remove(ident)
    }

    fn owned(&self, object_type: ObjectType) -> FsResult<&OwnedCollection> {
        self.scope.collection(object_type).ok_or(FsError::NoCollection {
            owner: ObjectType::Block,
            requested: object_type,
        })
    }

    fn open_entry(&self, object_type: ObjectType, entry: ObjectEntry) -> FsResult<EntityHandle> {
        EntityHandle::open(object_type, entry.path, self.scope.clone())
    }
}

impl Entity for BlockFs {
    fn entity(&self) -> &EntityFs {
        &self.entity
    }

    fn object_type(&self) -> ObjectType {
        ObjectType::Block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::owned::testing::SequentialIds;
    use dirstore_types::FileMode;

    fn block(tmp: &tempfile::TempDir) -> BlockFs {
        BlockFs::create(
            tmp.path().join("b1"),
            "b1",
            "session",
            "nix.session",
            DirOptions::default(),
            Arc::new(SequentialIds::new("e")),
        )
        .unwrap()
    }

    #[test]
    fn layout_has_one_directory_per_type() {
        let tmp = tempfile::tempdir().unwrap();
        block(&tmp);
        for name in ["sources", "data_arrays", "tags", "multi_tags", "groups"] {
            assert!(tmp.path().join("b1").join(name).is_dir(), "missing {name}");
        }
    }

    #[test]
    fn create_get_and_count() {
        let tmp = tempfile::tempdir().unwrap();
        let block = block(&tmp);

        let da = block.create_entity(ObjectType::DataArray, "voltage", "nix.sampled").unwrap();
        assert_eq!(da.object_type(), ObjectType::DataArray);
        assert_eq!(da.id(), "e1");
        block.create_entity(ObjectType::Tag, "spike", "").unwrap();

        assert_eq!(block.entity_count(ObjectType::DataArray).unwrap(), 1);
        assert_eq!(block.entity_count(ObjectType::Tag).unwrap(), 1);
        assert_eq!(block.entity_count(ObjectType::Feature).unwrap(), 0);

        let by_name = block
            .get_entity(&Identity::by_name("voltage", ObjectType::DataArray))
            .unwrap()
            .unwrap();
        assert_eq!(by_name.id(), "e1");
        assert!(by_name.into_data_array().is_some());
    }

    #[test]
    fn unsupported_types() {
        let tmp = tempfile::tempdir().unwrap();
        let block = block(&tmp);
        let err = block.create_entity(ObjectType::Feature, "f", "").unwrap_err();
        assert!(matches!(
            err,
            FsError::NoCollection {
                owner: ObjectType::Block,
                requested: ObjectType::Feature
            }
        ));
        assert!(!block.has_entity(&Identity::by_id("x", ObjectType::Block)).unwrap());
        assert!(block.get_entity(&Identity::by_id("x", ObjectType::Feature)).unwrap().is_none());
    }

    #[test]
    fn index_past_end_matches_empty_lookup() {
        let tmp = tempfile::tempdir().unwrap();
        let block = block(&tmp);
        block.create_entity(ObjectType::Source, "electrode", "").unwrap();

        assert!(block.get_entity_at(ObjectType::Source, 0).unwrap().is_some());
        assert!(block.get_entity_at(ObjectType::Source, 1).unwrap().is_none());
        assert!(block.get_entity(&Identity::empty(ObjectType::Source)).unwrap().is_none());
    }

    #[test]
    fn entities_lists_every_handle() {
        let tmp = tempfile::tempdir().unwrap();
        let block = block(&tmp);
        for name in ["a", "b", "c"] {
            block.create_entity(ObjectType::Group, name, "").unwrap();
        }
        let groups = block.entities(ObjectType::Group).unwrap();
        assert_eq!(groups.len(), 3);
        assert!(groups.iter().all(|g| g.object_type() == ObjectType::Group));
    }

    #[test]
    fn remove_entity() {
        let tmp = tempfile::tempdir().unwrap();
        let block = block(&tmp);
        block.create_entity_with_id(ObjectType::DataArray, "da1", "voltage", "").unwrap();

        assert!(block.remove_entity(&Identity::empty(ObjectType::DataArray)).is_err());
        assert!(block.remove_entity(&Identity::by_id("da1", ObjectType::DataArray)).unwrap());
        assert!(!block.has_entity(&Identity::by_id("da1", ObjectType::DataArray)).unwrap());
        assert!(!tmp.path().join("b1/data_arrays/da1").exists());
    }

    #[test]
    fn reopen_read_only() {
        let tmp = tempfile::tempdir().unwrap();
        let block = block(&tmp);
        block.create_entity_with_id(ObjectType::DataArray, "da1", "voltage", "").unwrap();

        let reopened = BlockFs::open(
            tmp.path().join("b1"),
            DirOptions::with_mode(FileMode::ReadOnly),
            Arc::new(SequentialIds::new("x")),
        )
        .unwrap();
        assert_eq!(reopened.id(), "b1");
        assert!(reopened.has_entity(&Identity::by_id("da1", ObjectType::DataArray)).unwrap());
        assert!(reopened.create_entity(ObjectType::DataArray, "other", "").is_err());
    }
}
