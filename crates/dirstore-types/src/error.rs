use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown object type: {0}")]
    UnknownObjectType(String),

    #[error("identity for {0} carries neither an id nor a name")]
    EmptyIdentity(String),

    #[error("invalid file mode: {0}")]
    InvalidFileMode(String),
}
