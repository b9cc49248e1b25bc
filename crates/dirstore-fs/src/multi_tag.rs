//! Multi-tags: tags whose positions and extents live in data arrays.

use std::path::PathBuf;
use std::sync::Arc;

use dirstore_types::{Identity, ObjectType};

use crate::block::BlockScope;
use crate::data_array::DataArrayFs;
use crate::entity::{Entity, EntityFs};
use crate::error::FsResult;
use crate::links::{LinkCollection, SingleLink};
use crate::tag::{TagParts, Tagging};
use crate::with_sources::{EntityWithSourcesFs, WithSources};

const POSITIONS_DIR: &str = "positions";
const EXTENTS_DIR: &str = "extents";

/// A tag marking many regions at once. Positions and extents are rows of
/// data arrays owned by the block.
#[derive(Clone, Debug)]
pub struct MultiTagFs {
    base: EntityWithSourcesFs,
    parts: TagParts,
    positions: SingleLink,
    extents: SingleLink,
}

impl MultiTagFs {
    pub fn open(location: impl Into<PathBuf>, scope: Arc<BlockScope>) -> FsResult<Self> {
        let entity = EntityFs::open_typed(location, ObjectType::MultiTag, scope.options())?;
        Self::from_entity(entity, scope)
    }

    pub(crate) fn from_entity(entity: EntityFs, scope: Arc<BlockScope>) -> FsResult<Self> {
        let parts = TagParts::open(&entity, ObjectType::MultiTag, &scope)?;
        let positions = SingleLink::open(&entity, POSITIONS_DIR, ObjectType::DataArray, scope.clone())?;
        let extents = SingleLink::open(&entity, EXTENTS_DIR, ObjectType::DataArray, scope.clone())?;
        Ok(Self {
            base: EntityWithSourcesFs::open(entity, scope)?,
            parts,
            positions,
            extents,
        })
    }

    pub fn positions(&self) -> FsResult<Option<DataArrayFs>> {
        self.open_link(&self.positions)
    }

    pub fn set_positions(&self, ident: &Identity) -> FsResult<()> {
        self.positions.set(ident)?;
        self.entity().touch()
    }

    pub fn extents(&self) -> FsResult<Option<DataArrayFs>> {
        self.open_link(&self.extents)
    }

    /// Set the extents array; `None` removes it.
    pub fn set_extents(&self, ident: Option<&Identity>) -> FsResult<()> {
        match ident {
            Some(ident) => self.extents.set(ident)?,
            None => {
                self.extents.clear()?;
            }
        }
        self.entity().touch()
    }

    fn open_link(&self, link: &SingleLink) -> FsResult<Option<DataArrayFs>> {
        match link.get()? {
            Some(entry) if entry.path.is_dir() => {
                DataArrayFs::open(entry.path, self.base.scope().clone()).map(Some)
            }
            _ => Ok(None),
        }
    }
}

impl Entity for MultiTagFs {
    fn entity(&self) -> &EntityFs {
        self.base.entity()
    }

    fn object_type(&self) -> ObjectType {
        ObjectType::MultiTag
    }
}

impl WithSources for MultiTagFs {
    fn source_links(&self) -> &LinkCollection {
        self.base.source_links()
    }
}

impl Tagging for MultiTagFs {
    fn parts(&self) -> &TagParts {
        &self.parts
    }
}
