//! Groups: named bundles of links into a block's data arrays, tags, and
//! multi-tags.
//!
//! A group owns no entity storage. Each of its three collections holds
//! links named by the linked entity's id:
//!
//! ```text
//! groups/<group-id>/data_arrays/<id> -> ../../../data_arrays/<id>
//! groups/<group-id>/tags/<id>        -> ../../../tags/<id>
//! groups/<group-id>/multi_tags/<id>  -> ../../../multi_tags/<id>
//! ```
//!
//! All operations are keyed by [`Identity`]; the identity's type selects
//! the collection. Lookups of types the group keeps no collection for are
//! simply absent, while mutations of such types fail with
//! [`FsError::NoCollection`].

use std::path::PathBuf;
use std::sync::Arc;

use dirstore_types::{Identity, ObjectType};

use crate::block::BlockScope;
use crate::entity::{Entity, EntityFs};
use crate::error::{FsError, FsResult};
use crate::handle::EntityHandle;
use crate::links::LinkCollection;
use crate::reconcile::ReconcileReport;
use crate::with_sources::{EntityWithSourcesFs, WithSources};

#[derive(Clone, Debug)]
pub struct GroupFs {
    base: EntityWithSourcesFs,
    data_arrays: LinkCollection,
    tags: LinkCollection,
    multi_tags: LinkCollection,
}

impl GroupFs {
    pub fn open(location: impl Into<PathBuf>, scope: Arc<BlockScope>) -> FsResult<Self> {
        let entity = EntityFs::open_typed(location, ObjectType::Group, scope.options())?;
        Self::from_entity(entity, scope)
    }

    /// Wrap an entity, creating the three link collections if writable.
    pub(crate) fn from_entity(entity: EntityFs, scope: Arc<BlockScope>) -> FsResult<Self> {
        let links = |ty: ObjectType| LinkCollection::open(&entity, ty.collection_name(), ty, scope.clone());
        let data_arrays = links(ObjectType::DataArray)?;
        let tags = links(ObjectType::Tag)?;
        let multi_tags = links(ObjectType::MultiTag)?;
        Ok(Self {
            base: EntityWithSourcesFs::open(entity, scope)?,
            data_arrays,
            tags,
            multi_tags,
        })
    }

    /// The link collection for `object_type`, if the group keeps one.
    pub fn collection(&self, object_type: ObjectType) -> Option<&LinkCollection> {
        match object_type {
            ObjectType::DataArray => Some(&self.data_arrays),
            ObjectType::Tag => Some(&self.tags),
            ObjectType::MultiTag => Some(&self.multi_tags),
            _ => None,
        }
    }

    pub fn has_entity(&self, ident: &Identity) -> FsResult<bool> {
        match self.collection(ident.object_type()) {
            Some(links) => links.has(ident),
            None => Ok(false),
        }
    }

    /// The linked entity `ident` resolves to, as a handle of its type.
    pub fn get_entity(&self, ident: &Identity) -> FsResult<Option<EntityHandle>> {
        let Some(links) = self.collection(ident.object_type()) else {
            return Ok(None);
        };
        match links.resolve_live(ident)? {
            Some(entry) => EntityHandle::open(ident.object_type(), entry.path, self.base.scope().clone()).map(Some),
            None => Ok(None),
        }
    }

    /// The linked entity at `index`. Past the end this is the same as a
    /// lookup with an empty identity.
    pub fn get_entity_at(&self, object_type: ObjectType, index: u64) -> FsResult<Option<EntityHandle>> {
        let id = match self.collection(object_type) {
            Some(links) => links.entry_at(index)?.map(|e| e.id).unwrap_or_default(),
            None => String::new(),
        };
        self.get_entity(&Identity::by_id(id, object_type))
    }

    pub fn entity_count(&self, object_type: ObjectType) -> FsResult<u64> {
        match self.collection(object_type) {
            Some(links) => links.count(),
            None => Ok(0),
        }
    }

    /// Handles for every live link of `object_type`. Dangling links are
    /// skipped.
    pub fn entities(&self, object_type: ObjectType) -> FsResult<Vec<EntityHandle>> {
        let Some(links) = self.collection(object_type) else {
            return Ok(Vec::new());
        };
        links
            .live_entries()?
            .into_iter()
            .map(|entry| EntityHandle::open(object_type, entry.path, self.base.scope().clone()))
            .collect()
    }

    /// Link a block-owned entity into the group.
    ///
    /// Returns `Ok(false)` if it was already linked.
    pub fn add_entity(&self, ident: &Identity) -> FsResult<bool> {
        self.links_for(ident.object_type())?.add(ident)
    }

    /// Unlink an entity. The block's storage is never touched.
    pub fn remove_entity(&self, ident: &Identity) -> FsResult<bool> {
        ident.require_key()?;
        self.links_for(ident.object_type())?.remove(ident)
    }

    /// Make the group's links of `object_type` exactly `entities`.
    ///
    /// Every entity is validated against the block first; on any failure
    /// nothing is changed.
    pub fn set_entities<E: Entity>(&self, object_type: ObjectType, entities: &[E]) -> FsResult<ReconcileReport> {
        let links = self.links_for(object_type)?;
        let idents = entities.iter().map(Entity::identity).collect::<FsResult<Vec<_>>>()?;
        links.set(&idents)
    }

    fn links_for(&self, object_type: ObjectType) -> FsResult<&LinkCollection> {
        self.collection(object_type).ok_or(FsError::NoCollection {
            owner: ObjectType::Group,
            requested: object_type,
        })
    }
}

impl Entity for GroupFs {
    fn entity(&self) -> &EntityFs {
        self.base.entity()
    }

    fn object_type(&self) -> ObjectType {
        ObjectType::Group
    }
}

impl WithSources for GroupFs {
    fn source_links(&self) -> &LinkCollection {
        self.base.source_links()
    }
}
