//! Features: a tag's link to a data array, with a link type.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use dirstore_types::{Identity, ObjectType};
use serde::{Deserialize, Serialize};

use crate::block::BlockScope;
use crate::data_array::DataArrayFs;
use crate::entity::{Entity, EntityFs, LINK_TYPE_KEY};
use crate::error::{FsError, FsResult};
use crate::links::SingleLink;

const DATA_DIR: &str = "data";

/// How a feature's data relates to the tagged region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    #[default]
    Tagged,
    Untagged,
    Indexed,
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tagged => "tagged",
            Self::Untagged => "untagged",
            Self::Indexed => "indexed",
        })
    }
}

/// Extra data attached to a tag or multi-tag, owned by it.
#[derive(Clone, Debug)]
pub struct FeatureFs {
    entity: EntityFs,
    scope: Arc<BlockScope>,
    data: SingleLink,
}

impl FeatureFs {
    pub fn open(location: impl Into<PathBuf>, scope: Arc<BlockScope>) -> FsResult<Self> {
        let entity = EntityFs::open_typed(location, ObjectType::Feature, scope.options())?;
        Self::from_entity(entity, scope)
    }

    pub(crate) fn from_entity(entity: EntityFs, scope: Arc<BlockScope>) -> FsResult<Self> {
        let data = SingleLink::open(&entity, DATA_DIR, ObjectType::DataArray, scope.clone())?;
        Ok(Self { entity, scope, data })
    }

    pub fn link_type(&self) -> FsResult<LinkType> {
        self.entity.get_attr(LINK_TYPE_KEY)?.ok_or_else(|| FsError::MissingAttribute {
            location: self.entity.location().to_path_buf(),
            key: LINK_TYPE_KEY.to_string(),
        })
    }

    pub fn set_link_type(&self, link_type: LinkType) -> FsResult<()> {
        self.entity.set_structural(LINK_TYPE_KEY, &link_type)
    }

    /// The linked data array. `None` if unset or if the array was deleted.
    pub fn data(&self) -> FsResult<Option<DataArrayFs>> {
        let Some(entry) = self.data.get()? else {
            return Ok(None);
        };
        if !entry.path.is_dir() {
            return Ok(None);
        }
        DataArrayFs::open(entry.path, self.scope.clone()).map(Some)
    }

    /// Point the feature at a block-owned data array.
    pub fn set_data(&self, ident: &Identity) -> FsResult<()> {
        self.data.set(ident)?;
        self.entity.touch()
    }
}

impl Entity for FeatureFs {
    fn entity(&self) -> &EntityFs {
        &self.entity
    }

    fn object_type(&self) -> ObjectType {
        ObjectType::Feature
    }
}
