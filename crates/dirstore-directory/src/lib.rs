//! Directory-backed typed collections for dirstore.
//!
//! A [`Directory`] turns one filesystem directory into a collection of
//! entity directories keyed by id. It provides the database primitives the
//! entity layer builds on, each implemented directly on directory and file
//! semantics:
//!
//! - **Unique keys**: children are named by entity id, so the filesystem's
//!   own name uniqueness enforces id uniqueness.
//! - **Attributes**: [`AttributeStore`] keeps typed records, one file per
//!   key, inside a hidden `.attributes` directory.
//! - **Secondary lookup**: [`Directory::find_by_name_or_attribute`] scans
//!   children linearly; there is no index.
//! - **Aliasing**: [`Directory::create_directory_link`] adds a non-owning
//!   child that resolves to storage owned by another collection.
//!
//! # Design Rules
//!
//! 1. Read-path absence is `Ok(None)` / `Ok(false)`, never an error.
//! 2. All I/O errors are propagated, never retried.
//! 3. Nothing is created or modified when the mode is read-only.
//! 4. Removing a link never touches the storage it points to.

pub mod attributes;
pub mod directory;
pub mod error;
pub mod keys;

pub use attributes::{AttributeStore, ATTRIBUTE_DIR};
pub use directory::{DirOptions, Directory, ObjectEntry, ID_KEY, NAME_KEY};
pub use error::{DirError, DirResult};
pub use keys::{is_valid_key, validate_key};
