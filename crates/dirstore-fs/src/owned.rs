//! Collections of entities whose storage is owned by the parent.

use std::path::Path;
use std::sync::Arc;

use dirstore_directory::{DirError, DirOptions, Directory, ObjectEntry, NAME_KEY};
use dirstore_types::{IdGenerator, Identity, ObjectType};
use tracing::debug;

use crate::entity::EntityFs;
use crate::error::{FsError, FsResult};
use crate::resolver;

/// Attempts at drawing an unused id before giving up.
const MAX_ID_ATTEMPTS: usize = 16;

/// A directory of entities of one type, created and destroyed here.
///
/// Blocks own one of these per entity type, sources own their nested
/// sources, tags own their features, and the file owns its blocks.
#[derive(Clone, Debug)]
pub struct OwnedCollection {
    dir: Directory,
    owner: ObjectType,
    object_type: ObjectType,
    ids: Arc<dyn IdGenerator>,
}

impl OwnedCollection {
    /// Open the collection for `object_type` below `parent`.
    pub fn open(
        parent: &Path,
        owner: ObjectType,
        object_type: ObjectType,
        options: DirOptions,
        ids: Arc<dyn IdGenerator>,
    ) -> FsResult<Self> {
        let dir = Directory::open(parent.join(object_type.collection_name()), options)?;
        Ok(Self {
            dir,
            owner,
            object_type,
            ids,
        })
    }

    pub fn directory(&self) -> &Directory {
        &self.dir
    }

    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    pub fn options(&self) -> DirOptions {
        self.dir.options()
    }

    pub fn ids(&self) -> &Arc<dyn IdGenerator> {
        &self.ids
    }

    /// Resolve an identity of this collection's type.
    pub fn resolve(&self, ident: &Identity) -> FsResult<Option<ObjectEntry>> {
        if ident.object_type() != self.object_type {
            return Ok(None);
        }
        resolver::resolve(&self.dir, ident)
    }

    pub fn has(&self, ident: &Identity) -> FsResult<bool> {
        Ok(self.resolve(ident)?.is_some())
    }

    pub fn count(&self) -> FsResult<u64> {
        Ok(self.dir.subdir_count()?)
    }

    /// The entry at `index`, or `None` past the end.
    pub fn entry_at(&self, index: u64) -> FsResult<Option<ObjectEntry>> {
        entry_at(&self.dir, index)
    }

    pub fn entries(&self) -> FsResult<Vec<ObjectEntry>> {
        Ok(self.dir.entries()?)
    }

    /// Create an entity with a generated id.
    pub fn create(&self, name: &str, kind: &str) -> FsResult<EntityFs> {
        if name.is_empty() {
            return Err(FsError::EmptyName(self.object_type));
        }
        let id = self.fresh_id()?;
        self.create_with_id(&id, name, kind)
    }

    /// Create an entity with a generated id that doubles as its name.
    pub fn create_unnamed(&self, kind: &str) -> FsResult<EntityFs> {
        let id = self.fresh_id()?;
        self.create_with_id(&id, &id, kind)
    }

    /// Create an entity with a caller-chosen id.
    pub fn create_with_id(&self, id: &str, name: &str, kind: &str) -> FsResult<EntityFs> {
        if name.is_empty() {
            return Err(FsError::EmptyName(self.object_type));
        }
        if self.dir.has_object(id)? {
            return Err(FsError::DuplicateId {
                object_type: self.object_type,
                id: id.to_string(),
            });
        }
        if self.dir.find_by_name_or_attribute(NAME_KEY, name)?.is_some() {
            return Err(FsError::DuplicateName {
                object_type: self.object_type,
                name: name.to_string(),
            });
        }
        let path = self.dir.create_subdir(id)?;
        let entity = EntityFs::create(path, id, self.object_type, name, kind, self.dir.options())?;
        debug!(owner = %self.owner, object_type = %self.object_type, id, name, "entity created");
        Ok(entity)
    }

    /// Delete the entity `ident` resolves to, with all its storage.
    ///
    /// Links pointing at it elsewhere are left in place.
    pub fn remove(&self, ident: &Identity) -> FsResult<bool> {
        ident.require_key()?;
        let Some(entry) = self.resolve(ident)? else {
            return Ok(false);
        };
        let removed = self.dir.remove_object(&entry.id)?;
        if removed {
            debug!(owner = %self.owner, object_type = %self.object_type, id = %entry.id, "entity removed");
        }
        Ok(removed)
    }

    fn fresh_id(&self) -> FsResult<String> {
        let mut last = String::new();
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = self.ids.create_id();
            if !self.dir.has_object(&id)? {
                return Ok(id);
            }
            last = id;
        }
        Err(FsError::DuplicateId {
            object_type: self.object_type,
            id: last,
        })
    }
}

/// Positional access mapping out-of-range to `None`.
pub(crate) fn entry_at(dir: &Directory, index: u64) -> FsResult<Option<ObjectEntry>> {
    match dir.sub_dir_by_index(index) {
        Ok(entry) => Ok(Some(entry)),
        Err(DirError::OutOfBounds { .. }) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
