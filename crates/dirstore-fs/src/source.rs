//! Sources: block-owned descriptions of where data came from, nestable.

use std::path::PathBuf;
use std::sync::Arc;

use dirstore_types::{Identity, ObjectType};

use crate::block::BlockScope;
use crate::entity::{Entity, EntityFs};
use crate::error::FsResult;
use crate::owned::OwnedCollection;

/// A source, owning a tree of nested sources.
#[derive(Clone, Debug)]
pub struct SourceFs {
    entity: EntityFs,
    scope: Arc<BlockScope>,
    children: OwnedCollection,
}

impl SourceFs {
    pub fn open(location: impl Into<PathBuf>, scope: Arc<BlockScope>) -> FsResult<Self> {
        let entity = EntityFs::open_typed(location, ObjectType::Source, scope.options())?;
        Self::from_entity(entity, scope)
    }

    pub(crate) fn from_entity(entity: EntityFs, scope: Arc<BlockScope>) -> FsResult<Self> {
        let children = OwnedCollection::open(
            entity.location(),
            ObjectType::Source,
            ObjectType::Source,
            entity.options(),
            scope.ids().clone(),
        )?;
        Ok(Self {
            entity,
            scope,
            children,
        })
    }

    pub fn create_source(&self, name: &str, kind: &str) -> FsResult<SourceFs> {
        let entity = self.children.create(name, kind)?;
        Self::from_entity(entity, self.scope.clone())
    }

    pub fn has_source(&self, ident: &Identity) -> FsResult<bool> {
        self.children.has(ident)
    }

    pub fn get_source(&self, ident: &Identity) -> FsResult<Option<SourceFs>> {
        match self.children.resolve(ident)? {
            Some(entry) => Self::open(entry.path, self.scope.clone()).map(Some),
            None => Ok(None),
        }
    }

    pub fn get_source_at(&self, index: u64) -> FsResult<Option<SourceFs>> {
        let id = self.children.entry_at(index)?.map(|e| e.id).unwrap_or_default();
        self.get_source(&Identity::by_id(id, ObjectType::Source))
    }

    pub fn source_count(&self) -> FsResult<u64> {
        self.children.count()
    }

    /// Delete a nested source and everything below it.
    pub fn remove_source(&self, ident: &Identity) -> FsResult<bool> {
        self.children.remove(ident)
    }

    pub fn sources(&self) -> FsResult<Vec<SourceFs>> {
        self.children
            .entries()?
            .into_iter()
            .map(|entry| Self::open(entry.path, self.scope.clone()))
            .collect()
    }
}

impl Entity for SourceFs {
    fn entity(&self) -> &EntityFs {
        &self.entity
    }

    fn object_type(&self) -> ObjectType {
        ObjectType::Source
    }
}
