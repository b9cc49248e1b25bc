use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// How a store is opened.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileMode {
    /// No mutation is allowed and no directory is ever created.
    ReadOnly,
    /// Open an existing store, or create one if absent.
    #[default]
    ReadWrite,
    /// Discard any existing store content on open.
    Overwrite,
}

impl FileMode {
    /// Returns `true` if this mode allows mutation.
    pub fn is_writable(&self) -> bool {
        !matches!(self, Self::ReadOnly)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReadOnly => "read_only",
            Self::ReadWrite => "read_write",
            Self::Overwrite => "overwrite",
        }
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileMode {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read_only" | "readonly" => Ok(Self::ReadOnly),
            "read_write" | "readwrite" => Ok(Self::ReadWrite),
            "overwrite" => Ok(Self::Overwrite),
            other => Err(TypeError::InvalidFileMode(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_read_write() {
        assert_eq!(FileMode::default(), FileMode::ReadWrite);
        assert!(FileMode::default().is_writable());
    }

    #[test]
    fn read_only_is_not_writable() {
        assert!(!FileMode::ReadOnly.is_writable());
        assert!(FileMode::Overwrite.is_writable());
    }

    #[test]
    fn parse_accepts_aliases() {
        assert_eq!("readonly".parse::<FileMode>().unwrap(), FileMode::ReadOnly);
        assert_eq!("overwrite".parse::<FileMode>().unwrap(), FileMode::Overwrite);
        assert!("append".parse::<FileMode>().is_err());
    }
}
