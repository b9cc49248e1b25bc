use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The declared type of a persisted entity.
///
/// Stored verbatim in every entity's `type` attribute record and used by
/// typed owners to select the collection responsible for an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectType {
    DataArray,
    Tag,
    MultiTag,
    Source,
    Block,
    Group,
    Feature,
}

impl ObjectType {
    /// All object types, in declaration order.
    pub const ALL: [ObjectType; 7] = [
        Self::DataArray,
        Self::Tag,
        Self::MultiTag,
        Self::Source,
        Self::Block,
        Self::Group,
        Self::Feature,
    ];

    /// Canonical string form, as written to the `type` record.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DataArray => "DataArray",
            Self::Tag => "Tag",
            Self::MultiTag => "MultiTag",
            Self::Source => "Source",
            Self::Block => "Block",
            Self::Group => "Group",
            Self::Feature => "Feature",
        }
    }

    /// Name of the on-disk collection directory holding entities of this type.
    pub fn collection_name(&self) -> &'static str {
        match self {
            Self::DataArray => "data_arrays",
            Self::Tag => "tags",
            Self::MultiTag => "multi_tags",
            Self::Source => "sources",
            Self::Block => "data",
            Self::Group => "groups",
            Self::Feature => "features",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| TypeError::UnknownObjectType(s.to_string()))
    }
}
