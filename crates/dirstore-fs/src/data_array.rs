//! Data arrays and their descriptive label and unit.

use std::path::PathBuf;
use std::sync::Arc;

use dirstore_types::ObjectType;

use crate::block::BlockScope;
use crate::entity::{Entity, EntityFs, LABEL_KEY, UNIT_KEY};
use crate::error::FsResult;
use crate::links::LinkCollection;
use crate::with_sources::{EntityWithSourcesFs, WithSources};

/// A data array's descriptive record. Sample storage lives elsewhere.
#[derive(Clone, Debug)]
pub struct DataArrayFs {
    base: EntityWithSourcesFs,
}

impl DataArrayFs {
    pub fn open(location: impl Into<PathBuf>, scope: Arc<BlockScope>) -> FsResult<Self> {
        let entity = EntityFs::open_typed(location, ObjectType::DataArray, scope.options())?;
        Self::from_entity(entity, scope)
    }

    pub(crate) fn from_entity(entity: EntityFs, scope: Arc<BlockScope>) -> FsResult<Self> {
        Ok(Self {
            base: EntityWithSourcesFs::open(entity, scope)?,
        })
    }

    /// Axis label of the stored values.
    pub fn label(&self) -> FsResult<Option<String>> {
        self.entity().get_attr(LABEL_KEY)
    }

    pub fn set_label(&self, label: Option<&str>) -> FsResult<()> {
        set_or_clear(self.entity(), LABEL_KEY, label)
    }

    pub fn unit(&self) -> FsResult<Option<String>> {
        self.entity().get_attr(UNIT_KEY)
    }

    pub fn set_unit(&self, unit: Option<&str>) -> FsResult<()> {
        set_or_clear(self.entity(), UNIT_KEY, unit)
    }
}

pub(crate) fn set_or_clear(entity: &EntityFs, key: &str, value: Option<&str>) -> FsResult<()> {
    match value {
        Some(value) => entity.set_structural(key, value),
        None => entity.remove_structural(key).map(|_| ()),
    }
}

impl Entity for DataArrayFs {
    fn entity(&self) -> &EntityFs {
        self.base.entity()
    }

    fn object_type(&self) -> ObjectType {
        ObjectType::DataArray
    }
}

impl WithSources for DataArrayFs {
    fn source_links(&self) -> &LinkCollection {
        self.base.source_links()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockFs;
    use crate::owned::testing::SequentialIds;
    use dirstore_directory::DirOptions;
    use dirstore_types::Identity;

    fn setup(tmp: &tempfile::TempDir) -> (BlockFs, DataArrayFs) {
        let block = BlockFs::create(
            tmp.path().join("b"),
            "b",
            "block",
            "",
            DirOptions::default(),
            Arc::new(SequentialIds::new("e")),
        )
        .unwrap();
        let da = block
            .create_entity(ObjectType::DataArray, "voltage", "nix.sampled")
            .unwrap()
            .into_data_array()
            .unwrap();
        (block, da)
    }

    #[test]
    fn label_and_unit() {
        let tmp = tempfile::tempdir().unwrap();
        let (_block, da) = setup(&tmp);

        assert!(da.label().unwrap().is_none());
        da.set_label(Some("membrane potential")).unwrap();
        da.set_unit(Some("mV")).unwrap();
        assert_eq!(da.label().unwrap().as_deref(), Some("membrane potential"));
        assert_eq!(da.unit().unwrap().as_deref(), Some("mV"));

        da.set_unit(None).unwrap();
        assert!(da.unit().unwrap().is_none());
        assert!(da.entity().attr_keys().unwrap().is_empty());
    }

    #[test]
    fn sources_are_links() {
        let tmp = tempfile::tempdir().unwrap();
        let (block, da) = setup(&tmp);
        let s1 = block.create_entity(ObjectType::Source, "electrode", "").unwrap().into_source().unwrap();
        let s2 = block.create_entity(ObjectType::Source, "cell", "").unwrap().into_source().unwrap();

        assert!(da.add_source(&Identity::by_name("electrode", ObjectType::Source)).unwrap());
        assert_eq!(da.source_count().unwrap(), 1);
        assert_eq!(da.get_source_at(0).unwrap().unwrap().id(), s1.id());

        let report = da.set_sources(&[s2.clone()]).unwrap();
        assert_eq!(report.added.len(), 1);
        assert_eq!(report.removed.len(), 1);
        assert!(da.has_source(&Identity::by_id(s2.id(), ObjectType::Source)).unwrap());
        assert!(da.set_sources(&[s2.clone()]).unwrap().is_unchanged());

        assert!(da.remove_source(&Identity::by_id(s2.id(), ObjectType::Source)).unwrap());
        assert!(block.has_entity(&Identity::by_id(s2.id(), ObjectType::Source)).unwrap());
    }

    #[test]
    fn foreign_source_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let (_block, da) = setup(&tmp);
        let err = da.add_source(&Identity::by_name("nowhere", ObjectType::Source)).unwrap_err();
        assert!(err.is_precondition());
    }
}
