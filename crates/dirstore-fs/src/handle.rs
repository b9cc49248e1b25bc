//! Typed handles over any entity a block can hold.

use std::path::PathBuf;
use std::sync::Arc;

use dirstore_types::ObjectType;

use crate::block::BlockScope;
use crate::data_array::DataArrayFs;
use crate::entity::{Entity, EntityFs};
use crate::error::{FsError, FsResult};
use crate::feature::FeatureFs;
use crate::group::GroupFs;
use crate::multi_tag::MultiTagFs;
use crate::source::SourceFs;
use crate::tag::TagFs;

/// A live handle to an entity below a block, selected by its type.
#[derive(Clone, Debug)]
pub enum EntityHandle {
    DataArray(DataArrayFs),
    Tag(TagFs),
    MultiTag(MultiTagFs),
    Source(SourceFs),
    Group(GroupFs),
    Feature(FeatureFs),
}

impl EntityHandle {
    /// Open the entity at `location` as a handle of `object_type`.
    pub fn open(object_type: ObjectType, location: impl Into<PathBuf>, scope: Arc<BlockScope>) -> FsResult<Self> {
        let entity = EntityFs::open_typed(location, object_type, scope.options())?;
        Self::from_entity(object_type, entity, scope)
    }

    pub(crate) fn from_entity(object_type: ObjectType, entity: EntityFs, scope: Arc<BlockScope>) -> FsResult<Self> {
        Ok(match object_type {
            ObjectType::DataArray => Self::DataArray(DataArrayFs::from_entity(entity, scope)?),
            ObjectType::Tag => Self::Tag(TagFs::from_entity(entity, scope)?),
            ObjectType::MultiTag => Self::MultiTag(MultiTagFs::from_entity(entity, scope)?),
            ObjectType::Source => Self::Source(SourceFs::from_entity(entity, scope)?),
            ObjectType::Group => Self::Group(GroupFs::from_entity(entity, scope)?),
            ObjectType::Feature => Self::Feature(FeatureFs::from_entity(entity, scope)?),
            ObjectType::Block => {
                return Err(FsError::NoCollection {
                    owner: ObjectType::Block,
                    requested: ObjectType::Block,
                })
            }
        })
    }

    pub fn as_entity(&self) -> &dyn Entity {
        match self {
            Self::DataArray(e) => e,
            Self::Tag(e) => e,
            Self::MultiTag(e) => e,
            Self::Source(e) => e,
            Self::Group(e) => e,
            Self::Feature(e) => e,
        }
    }

    pub fn into_data_array(self) -> Option<DataArrayFs> {
        match self {
            Self::DataArray(e) => Some(e),
            _ => None,
        }
    }

    pub fn into_tag(self) -> Option<TagFs> {
        match self {
            Self::Tag(e) => Some(e),
            _ => None,
        }
    }

    pub fn into_multi_tag(self) -> Option<MultiTagFs> {
        match self {
            Self::MultiTag(e) => Some(e),
            _ => None,
        }
    }

    pub fn into_source(self) -> Option<SourceFs> {
        match self {
            Self::Source(e) => Some(e),
            _ => None,
        }
    }

    pub fn into_group(self) -> Option<GroupFs> {
        match self {
            Self::Group(e) => Some(e),
            _ => None,
        }
    }

    pub fn into_feature(self) -> Option<FeatureFs> {
        match self {
            Self::Feature(e) => Some(e),
            _ => None,
        }
    }
}

impl Entity for EntityHandle {
    fn entity(&self) -> &EntityFs {
        self.as_entity().entity()
    }

    fn object_type(&self) -> ObjectType {
        self.as_entity().object_type()
    }
}
