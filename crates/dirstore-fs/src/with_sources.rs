//! Entities that link to block-owned sources.

use std::sync::Arc;

use dirstore_types::{Identity, ObjectType};

use crate::block::BlockScope;
use crate::entity::{Entity, EntityFs};
use crate::error::FsResult;
use crate::links::LinkCollection;
use crate::reconcile::ReconcileReport;
use crate::source::SourceFs;

/// Name of the link directory holding an entity's sources.
pub const SOURCES_DIR: &str = "sources";

/// An entity plus its `sources` link collection.
#[derive(Clone, Debug)]
pub struct EntityWithSourcesFs {
    entity: EntityFs,
    sources: LinkCollection,
}

impl EntityWithSourcesFs {
    pub fn open(entity: EntityFs, scope: Arc<BlockScope>) -> FsResult<Self> {
        let sources = LinkCollection::open(&entity, SOURCES_DIR, ObjectType::Source, scope)?;
        Ok(Self { entity, sources })
    }

    pub fn entity(&self) -> &EntityFs {
        &self.entity
    }

    pub fn source_links(&self) -> &LinkCollection {
        &self.sources
    }

    pub fn scope(&self) -> &Arc<BlockScope> {
        self.sources.scope()
    }
}

/// Source relations shared by data arrays, tags, multi-tags, and groups.
pub trait WithSources: Entity {
    fn source_links(&self) -> &LinkCollection;

    /// Link a source owned by the block.
    fn add_source(&self, ident: &Identity) -> FsResult<bool> {
        self.source_links().add(ident)
    }

    fn has_source(&self, ident: &Identity) -> FsResult<bool> {
        self.source_links().has(ident)
    }

    fn get_source(&self, ident: &Identity) -> FsResult<Option<SourceFs>> {
        let links = self.source_links();
        match links.resolve_live(ident)? {
            Some(entry) => SourceFs::open(entry.path, links.scope().clone()).map(Some),
            None => Ok(None),
        }
    }

    fn get_source_at(&self, index: u64) -> FsResult<Option<SourceFs>> {
        let id = self.source_links().entry_at(index)?.map(|e| e.id).unwrap_or_default();
        self.get_source(&Identity::by_id(id, ObjectType::Source))
    }

    fn source_count(&self) -> FsResult<u64> {
        self.source_links().count()
    }

    /// Unlink a source; the source itself stays in the block.
    fn remove_source(&self, ident: &Identity) -> FsResult<bool> {
        self.source_links().remove(ident)
    }

    /// Make the linked sources exactly `sources`.
    fn set_sources(&self, sources: &[SourceFs]) -> FsResult<ReconcileReport> {
        let idents = sources.iter().map(Entity::identity).collect::<FsResult<Vec<_>>>()?;
        self.source_links().set(&idents)
    }
}
