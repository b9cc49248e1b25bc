use std::io;
use std::path::PathBuf;

/// Errors produced by directory-level storage operations.
#[derive(Debug, thiserror::Error)]
pub enum DirError {
    /// I/O error from the underlying filesystem.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Positional access beyond the number of children.
    #[error("index {index} out of bounds for collection of {count}")]
    OutOfBounds { index: u64, count: u64 },

    /// The store was opened read-only.
    #[error("store is read-only")]
    ReadOnly,

    /// An attribute key or child name that cannot be stored as a single
    /// directory entry.
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// Attribute value could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A path that must be a directory is something else.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A link target that does not exist or cannot be expressed as a link.
    #[error("invalid link target: {0}")]
    LinkTarget(PathBuf),
}

/// Result alias for directory operations.
pub type DirResult<T> = Result<T, DirError>;
