//! Tags and the reference/feature capabilities they share with multi-tags.

use std::path::PathBuf;
use std::sync::Arc;

use dirstore_types::{Identity, ObjectType};

use crate::block::BlockScope;
use crate::data_array::DataArrayFs;
use crate::entity::{Entity, EntityFs, EXTENT_KEY, POSITION_KEY, UNITS_KEY};
use crate::error::{FsError, FsResult};
use crate::feature::{FeatureFs, LinkType};
use crate::links::LinkCollection;
use crate::owned::OwnedCollection;
use crate::reconcile::ReconcileReport;
use crate::with_sources::{EntityWithSourcesFs, WithSources};

/// Name of the link directory holding a tag's referenced data arrays.
pub const REFERENCES_DIR: &str = "references";

/// References and features of a tag or multi-tag.
#[derive(Clone, Debug)]
pub struct TagParts {
    references: LinkCollection,
    features: OwnedCollection,
}

impl TagParts {
    pub(crate) fn open(entity: &EntityFs, owner: ObjectType, scope: &Arc<BlockScope>) -> FsResult<Self> {
        Ok(Self {
            references: LinkCollection::open(entity, REFERENCES_DIR, ObjectType::DataArray, scope.clone())?,
            features: OwnedCollection::open(
                entity.location(),
                owner,
                ObjectType::Feature,
                entity.options(),
                scope.ids().clone(),
            )?,
        })
    }
}

/// Capabilities shared by [`TagFs`] and [`MultiTagFs`](crate::MultiTagFs).
pub trait Tagging: WithSources {
    fn parts(&self) -> &TagParts;

    /// Reference a block-owned data array.
    fn add_reference(&self, ident: &Identity) -> FsResult<bool> {
        self.parts().references.add(ident)
    }

    fn has_reference(&self, ident: &Identity) -> FsResult<bool> {
        self.parts().references.has(ident)
    }

    fn get_reference(&self, ident: &Identity) -> FsResult<Option<DataArrayFs>> {
        let refs = &self.parts().references;
        match refs.resolve_live(ident)? {
            Some(entry) => DataArrayFs::open(entry.path, refs.scope().clone()).map(Some),
            None => Ok(None),
        }
    }

    fn get_reference_at(&self, index: u64) -> FsResult<Option<DataArrayFs>> {
        let id = self.parts().references.entry_at(index)?.map(|e| e.id).unwrap_or_default();
        self.get_reference(&Identity::by_id(id, ObjectType::DataArray))
    }

    fn reference_count(&self) -> FsResult<u64> {
        self.parts().references.count()
    }

    fn remove_reference(&self, ident: &Identity) -> FsResult<bool> {
        self.parts().references.remove(ident)
    }

    fn set_references(&self, arrays: &[DataArrayFs]) -> FsResult<ReconcileReport> {
        let idents = arrays.iter().map(Entity::identity).collect::<FsResult<Vec<_>>>()?;
        self.parts().references.set(&idents)
    }

    /// Create a feature linking `data` with the given link type.
    ///
    /// The data array is checked against the block before anything is
    /// written.
    fn create_feature(&self, data: &Identity, link_type: LinkType) -> FsResult<FeatureFs> {
        let scope = self.parts().references.scope().clone();
        let owned = scope.collection(ObjectType::DataArray).ok_or(FsError::NoCollection {
            owner: ObjectType::Block,
            requested: ObjectType::DataArray,
        })?;
        if data.object_type() != ObjectType::DataArray || !owned.has(data)? {
            return Err(FsError::EntityNotInBlock(data.clone()));
        }
        let entity = self.parts().features.create_unnamed("")?;
        let feature = FeatureFs::from_entity(entity, scope)?;
        feature.set_link_type(link_type)?;
        feature.set_data(data)?;
        Ok(feature)
    }

    fn has_feature(&self, ident: &Identity) -> FsResult<bool> {
        self.parts().features.has(ident)
    }

    fn get_feature(&self, ident: &Identity) -> FsResult<Option<FeatureFs>> {
        let parts = self.parts();
        match parts.features.resolve(ident)? {
            Some(entry) => FeatureFs::open(entry.path, parts.references.scope().clone()).map(Some),
            None => Ok(None),
        }
    }

    fn get_feature_at(&self, index: u64) -> FsResult<Option<FeatureFs>> {
        let id = self.parts().features.entry_at(index)?.map(|e| e.id).unwrap_or_default();
        self.get_feature(&Identity::by_id(id, ObjectType::Feature))
    }

    fn feature_count(&self) -> FsResult<u64> {
        self.parts().features.count()
    }

    fn remove_feature(&self, ident: &Identity) -> FsResult<bool> {
        self.parts().features.remove(ident)
    }

    fn features(&self) -> FsResult<Vec<FeatureFs>> {
        let parts = self.parts();
        parts
            .features
            .entries()?
            .into_iter()
            .map(|entry| FeatureFs::open(entry.path, parts.references.scope().clone()))
            .collect()
    }

    /// Units of the position and extent axes.
    fn units(&self) -> FsResult<Vec<String>> {
        Ok(self.entity().get_attr(UNITS_KEY)?.unwrap_or_default())
    }

    fn set_units(&self, units: &[String]) -> FsResult<()> {
        self.entity().set_structural(UNITS_KEY, units)
    }
}

/// A tag marking one region, given by position and optional extent.
#[derive(Clone, Debug)]
pub struct TagFs {
    base: EntityWithSourcesFs,
    parts: TagParts,
}

impl TagFs {
    pub fn open(location: impl Into<PathBuf>, scope: Arc<BlockScope>) -> FsResult<Self> {
        let entity = EntityFs::open_typed(location, ObjectType::Tag, scope.options())?;
        Self::from_entity(entity, scope)
    }

    pub(crate) fn from_entity(entity: EntityFs, scope: Arc<BlockScope>) -> FsResult<Self> {
        let parts = TagParts::open(&entity, ObjectType::Tag, &scope)?;
        Ok(Self {
            base: EntityWithSourcesFs::open(entity, scope)?,
            parts,
        })
    }

    /// Start of the tagged region; empty until set.
    pub fn position(&self) -> FsResult<Vec<f64>> {
        Ok(self.entity().get_attr(POSITION_KEY)?.unwrap_or_default())
    }

    pub fn set_position(&self, position: &[f64]) -> FsResult<()> {
        self.entity().set_structural(POSITION_KEY, position)
    }

    pub fn extent(&self) -> FsResult<Option<Vec<f64>>> {
        self.entity().get_attr(EXTENT_KEY)
    }

    /// Set the extent; `None` makes the tag a point.
    pub fn set_extent(&self, extent: Option<&[f64]>) -> FsResult<()> {
        match extent {
            Some(extent) => self.entity().set_structural(EXTENT_KEY, extent),
            None => self.entity().remove_structural(EXTENT_KEY).map(|_| ()),
        }
    }
}

impl Entity for TagFs {
    fn entity(&self) -> &EntityFs {
        self.base.entity()
    }

    fn object_type(&self) -> ObjectType {
        ObjectType::Tag
    }
}

impl WithSources for TagFs {
    fn source_links(&self) -> &LinkCollection {
        self.base.source_links()
    }
}

impl Tagging for TagFs {
    fn parts(&self) -> &TagParts {
        &self.parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockFs;
    use crate::owned::testing::SequentialIds;
    use dirstore_directory::DirOptions;

    fn setup(tmp: &tempfile::TempDir) -> (BlockFs, TagFs) {
        let block = BlockFs::create(
            tmp.path().join("b"),
            "b",
            "block",
            "",
            DirOptions::default(),
            Arc::new(SequentialIds::new("e")),
        )
        .unwrap();
        let tag = block.create_entity(ObjectType::Tag, "spike", "").unwrap().into_tag().unwrap();
        (block, tag)
    }

    fn array(block: &BlockFs, name: &str) -> DataArrayFs {
        block
            .create_entity(ObjectType::DataArray, name, "")
            .unwrap()
            .into_data_array()
            .unwrap()
    }

    #[test]
    fn position_extent_units() {
        let tmp = tempfile::tempdir().unwrap();
        let (_block, tag) = setup(&tmp);

        assert!(tag.position().unwrap().is_empty());
        tag.set_position(&[1.5, 2.0]).unwrap();
        tag.set_extent(Some(&[0.5, 0.5])).unwrap();
        tag.set_units(&["s".to_string(), "mV".to_string()]).unwrap();

        assert_eq!(tag.position().unwrap(), vec![1.5, 2.0]);
        assert_eq!(tag.extent().unwrap(), Some(vec![0.5, 0.5]));
        assert_eq!(tag.units().unwrap(), vec!["s", "mV"]);

        tag.set_extent(None).unwrap();
        assert!(tag.extent().unwrap().is_none());
    }

    #[test]
    fn references() {
        let tmp = tempfile::tempdir().unwrap();
        let (block, tag) = setup(&tmp);
        let a = array(&block, "a");
        let b = array(&block, "b");

        assert!(tag.add_reference(&a.identity().unwrap()).unwrap());
        assert_eq!(tag.reference_count().unwrap(), 1);
        assert_eq!(tag.get_reference_at(0).unwrap().unwrap().id(), a.id());
        assert!(tag.get_reference_at(1).unwrap().is_none());

        tag.set_references(&[b.clone()]).unwrap();
        assert!(!tag.has_reference(&a.identity().unwrap()).unwrap());
        assert!(tag.has_reference(&Identity::by_name("b", ObjectType::DataArray)).unwrap());

        assert!(tag.remove_reference(&b.identity().unwrap()).unwrap());
        assert!(block.has_entity(&b.identity().unwrap()).unwrap());
    }

    #[test]
    fn features_link_data() {
        let tmp = tempfile::tempdir().unwrap();
        let (block, tag) = setup(&tmp);
        let a = array(&block, "stimulus");

        let feature = tag.create_feature(&a.identity().unwrap(), LinkType::Untagged).unwrap();
        assert_eq!(feature.link_type().unwrap(), LinkType::Untagged);
        assert_eq!(feature.data().unwrap().unwrap().id(), a.id());
        assert_eq!(tag.feature_count().unwrap(), 1);

        let fetched = tag.get_feature_at(0).unwrap().unwrap();
        assert_eq!(fetched.id(), feature.id());
        fetched.set_link_type(LinkType::Indexed).unwrap();
        assert_eq!(feature.link_type().unwrap(), LinkType::Indexed);

        assert!(tag.remove_feature(&feature.identity().unwrap()).unwrap());
        assert_eq!(tag.features().unwrap().len(), 0);
        assert!(block.has_entity(&a.identity().unwrap()).unwrap());
    }

    #[test]
    fn feature_requires_owned_data() {
        let tmp = tempfile::tempdir().unwrap();
        let (_block, tag) = setup(&tmp);
        let err = tag
            .create_feature(&Identity::by_id("ghost", ObjectType::DataArray), LinkType::Tagged)
            .unwrap_err();
        assert!(matches!(err, FsError::EntityNotInBlock(_)));
        assert_eq!(tag.feature_count().unwrap(), 0);
    }

    #[test]
    fn feature_data_dangles_after_delete() {
        let tmp = tempfile::tempdir().unwrap();
        let (block, tag) = setup(&tmp);
        let a = array(&block, "stimulus");
        let feature = tag.create_feature(&a.identity().unwrap(), LinkType::Tagged).unwrap();

        block.remove_entity(&a.identity().unwrap()).unwrap();
        assert!(feature.data().unwrap().is_none());
    }

    #[test]
    fn deleted_reference_reads_as_absent() {
        let tmp = tempfile::tempdir().unwrap();
        let (block, tag) = setup(&tmp);
        let a = array(&block, "stimulus");
        let ident = a.identity().unwrap();
        tag.add_reference(&ident).unwrap();

        block.remove_entity(&ident).unwrap();
        assert_eq!(tag.reference_count().unwrap(), 1);
        assert!(!tag.has_reference(&ident).unwrap());
        assert!(tag.get_reference(&ident).unwrap().is_none());
        assert!(tag.get_reference_at(0).unwrap().is_none());
        assert!(tag.remove_reference(&ident).unwrap());
    }
}
