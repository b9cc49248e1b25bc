use std::path::PathBuf;

use dirstore_directory::DirError;
use dirstore_types::{Identity, ObjectType, TypeError};
use thiserror::Error;

/// Errors produced by entity-level operations.
///
/// Read-path absence is never an error here: lookups return `Ok(None)` or
/// `Ok(false)`. The variants below are storage failures or caller misuse.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("directory error: {0}")]
    Dir(#[from] DirError),

    #[error("type error: {0}")]
    Type(#[from] TypeError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Linking requires the target to be owned by the block.
    #[error("entity does not exist in this block: {0}")]
    EntityNotInBlock(Identity),

    /// The owner keeps no collection for the requested type.
    #[error("{owner} has no collection for {requested}")]
    NoCollection {
        owner: ObjectType,
        requested: ObjectType,
    },

    /// A required attribute record is absent, e.g. behind a dangling link.
    #[error("missing attribute {key:?} at {location}")]
    MissingAttribute { location: PathBuf, key: String },

    #[error("{object_type} with name {name:?} already exists")]
    DuplicateName {
        object_type: ObjectType,
        name: String,
    },

    #[error("{object_type} with id {id:?} already exists")]
    DuplicateId { object_type: ObjectType, id: String },

    #[error("{0} name must not be empty")]
    EmptyName(ObjectType),

    /// Structural attributes cannot be written through the free-form API.
    #[error("attribute {0:?} is reserved")]
    ReservedAttribute(String),

    #[error("expected {expected}, got {actual}")]
    TypeMismatch {
        expected: ObjectType,
        actual: ObjectType,
    },

    #[error("store not found: {0}")]
    NotFound(PathBuf),

    #[error("incompatible store format at {location}: {found}")]
    IncompatibleFormat { location: PathBuf, found: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl FsError {
    /// Returns `true` for errors caused by caller misuse rather than by the
    /// storage environment.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::EntityNotInBlock(_)
                | Self::Type(TypeError::EmptyIdentity(_))
                | Self::NoCollection { .. }
                | Self::DuplicateName { .. }
                | Self::DuplicateId { .. }
                | Self::EmptyName(_)
                | Self::ReservedAttribute(_)
                | Self::TypeMismatch { .. }
        )
    }
}

/// Result alias for entity operations.
pub type FsResult<T> = Result<T, FsError>;
