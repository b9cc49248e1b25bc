//! Filesystem entity store.
//!
//! A store is a directory tree: one directory per entity, one file per
//! attribute, and symbolic links for relations that do not own their
//! target.
//!
//! ```text
//! <root>/.attributes/{format,version,created,updated}
//! <root>/data/<block-id>/sources/<source-id>/
//! <root>/data/<block-id>/data_arrays/<id>/
//! <root>/data/<block-id>/tags/<id>/
//! <root>/data/<block-id>/multi_tags/<id>/
//! <root>/data/<block-id>/groups/<group-id>/data_arrays/<id>  (link)
//! ```
//!
//! # Ownership
//!
//! A [`BlockFs`] owns the storage of every entity below it. Groups, tags,
//! and entities with sources hold [`LinkCollection`]s whose entries alias
//! block-owned directories. Adding a link requires the block to own the
//! target; removing a link never deletes it. Deleting an owned entity does
//! not cascade, so links to it may dangle. Reads treat a dangling link as
//! absent; see [`FileFs::find_dangling_links`] for cleanup.
//!
//! # Lookup
//!
//! Every keyed operation takes an [`Identity`]. The id is tried first, the
//! name is a fallback found by scanning, and when both are given they must
//! name the same entity. Absence is `Ok(None)` or `Ok(false)`; errors are
//! reserved for storage failures and caller misuse.
//!
//! # Example
//!
//! ```no_run
//! use dirstore_fs::{Entity, FileFs, Identity, ObjectType, StoreConfig};
//!
//! let file = FileFs::open("/tmp/recording", StoreConfig::default())?;
//! let block = file.create_block("session 1", "nix.session")?;
//! let da = block.create_entity(ObjectType::DataArray, "voltage", "nix.sampled")?;
//! let group = block
//!     .create_entity(ObjectType::Group, "trial 1", "")?
//!     .into_group()
//!     .expect("group handle");
//!
//! group.add_entity(&da.identity()?)?;
//! assert_eq!(group.entity_count(ObjectType::DataArray)?, 1);
//! assert!(group.has_entity(&Identity::by_name("voltage", ObjectType::DataArray))?);
//! # Ok::<(), dirstore_fs::FsError>(())
//! ```

pub mod block;
pub mod config;
pub mod data_array;
pub mod entity;
pub mod error;
pub mod feature;
pub mod file;
pub mod group;
pub mod handle;
pub mod links;
pub mod multi_tag;
pub mod owned;
pub mod reconcile;
pub mod resolver;
pub mod source;
pub mod tag;
pub mod with_sources;

pub use block::{BlockFs, BlockScope};
pub use config::StoreConfig;
pub use data_array::DataArrayFs;
pub use entity::{Entity, EntityFs};
pub use error::{FsError, FsResult};
pub use feature::{FeatureFs, LinkType};
pub use file::{FileFs, FORMAT, VERSION};
pub use group::GroupFs;
pub use handle::EntityHandle;
pub use links::{LinkCollection, SingleLink};
pub use multi_tag::MultiTagFs;
pub use owned::OwnedCollection;
pub use reconcile::{Member, ReconcileReport};
pub use source::SourceFs;
pub use tag::{TagFs, TagParts, Tagging};
pub use with_sources::{EntityWithSourcesFs, WithSources};

pub use dirstore_types::{FileMode, IdGenerator, Identity, ObjectType, UuidGenerator};
