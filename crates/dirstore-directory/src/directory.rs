use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use dirstore_types::FileMode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::attributes::{is_missing, AttributeStore};
use crate::error::{DirError, DirResult};
use crate::keys::{is_valid_key, validate_key};

/// Attribute key holding an entity's name.
pub const NAME_KEY: &str = "name";

/// Attribute key holding an entity's id.
pub const ID_KEY: &str = "id";

/// How a [`Directory`] is opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirOptions {
    pub mode: FileMode,
    /// Store link targets relative to the link's parent instead of absolute.
    pub relative_links: bool,
}

impl Default for DirOptions {
    fn default() -> Self {
        Self {
            mode: FileMode::ReadWrite,
            relative_links: true,
        }
    }
}

impl DirOptions {
    pub fn with_mode(mode: FileMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }
}

/// One child of a [`Directory`]: its id (the entry name) and its path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectEntry {
    pub id: String,
    pub path: PathBuf,
    /// `true` if the entry is a link to storage owned elsewhere.
    pub is_link: bool,
}

impl ObjectEntry {
    /// Returns `true` if this is a link whose target no longer exists.
    pub fn is_dangling(&self) -> DirResult<bool> {
        if !self.is_link {
            return Ok(false);
        }
        match fs::metadata(&self.path) {
            Ok(_) => Ok(false),
            Err(e) if is_missing(&e) => Ok(true),
            Err(e) => Err(e.into()),
        }
    }
}

/// A filesystem directory viewed as a collection of entity directories keyed
/// by id.
///
/// Children are either real directories (owned storage) or links to
/// directories owned by another collection. Hidden entries (names starting
/// with `.`) hold bookkeeping such as attribute records and are never
/// reported as children.
///
/// Enumeration is sorted by id so positional access is repeatable for a
/// given set of children; callers must not read any meaning into the order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Directory {
    location: PathBuf,
    options: DirOptions,
    attrs: AttributeStore,
}

impl Directory {
    /// Open the directory at `location`, creating it if the mode allows.
    pub fn open(location: impl Into<PathBuf>, options: DirOptions) -> DirResult<Self> {
        let location = location.into();
        if options.mode.is_writable() {
            fs::create_dir_all(&location)?;
        }
        match fs::metadata(&location) {
            Ok(meta) if !meta.is_dir() => return Err(DirError::NotADirectory(location)),
            Ok(_) => {}
            Err(e) if is_missing(&e) => {}
            Err(e) => return Err(e.into()),
        }

        let attrs = AttributeStore::new(&location, options.mode);
        Ok(Self {
            location,
            options,
            attrs,
        })
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn options(&self) -> DirOptions {
        self.options
    }

    pub fn mode(&self) -> FileMode {
        self.options.mode
    }

    /// Returns `true` if the directory exists on disk.
    pub fn exists(&self) -> bool {
        self.location.is_dir()
    }

    /// Attribute records of this directory itself.
    pub fn attributes(&self) -> &AttributeStore {
        &self.attrs
    }

    pub fn get_attr<T: DeserializeOwned>(&self, key: &str) -> DirResult<Option<T>> {
        self.attrs.get_attr(key)
    }

    pub fn set_attr<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> DirResult<()> {
        self.attrs.set_attr(key, value)
    }

    /// Path a child with the given id has, or would have.
    pub fn child_path(&self, id: &str) -> PathBuf {
        self.location.join(id)
    }

    /// Returns `true` iff a child named exactly `key` exists.
    ///
    /// Links count as present even when their target is gone. Keys that can
    /// never name a child (empty, containing separators, hidden) are simply
    /// absent.
    pub fn has_object(&self, key: &str) -> DirResult<bool> {
        Ok(self.entry(key)?.is_some())
    }

    /// The child named exactly `key`, if present. Never reads attributes.
    pub fn entry(&self, key: &str) -> DirResult<Option<ObjectEntry>> {
        if !is_valid_key(key) {
            return Ok(None);
        }
        let path = self.child_path(key);
        let meta = match fs::symlink_metadata(&path) {
            Ok(meta) => meta,
            Err(e) if is_missing(&e) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let is_link = meta.file_type().is_symlink();
        if !(is_link || meta.is_dir()) {
            return Ok(None);
        }
        Ok(Some(ObjectEntry {
            id: key.to_string(),
            path,
            is_link,
        }))
    }

    /// All children, sorted by id.
    pub fn entries(&self) -> DirResult<Vec<ObjectEntry>> {
        let iter = match fs::read_dir(&self.location) {
            Ok(iter) => iter,
            Err(e) if is_missing(&e) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for entry in iter {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                warn!(location = %self.location.display(), name = ?file_name, "skipping non-UTF-8 entry");
                continue;
            };
            if !is_valid_key(name) {
                continue;
            }
            let file_type = entry.file_type()?;
            if file_type.is_dir() || file_type.is_symlink() {
                entries.push(ObjectEntry {
                    id: name.to_string(),
                    path: entry.path(),
                    is_link: file_type.is_symlink(),
                });
            }
        }
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(entries)
    }

    /// Ids of all children, sorted.
    pub fn object_ids(&self) -> DirResult<Vec<String>> {
        Ok(self.entries()?.into_iter().map(|e| e.id).collect())
    }

    /// Number of children, links included.
    pub fn subdir_count(&self) -> DirResult<u64> {
        Ok(self.entries()?.len() as u64)
    }

    /// The child at `index` in enumeration order.
    pub fn sub_dir_by_index(&self, index: u64) -> DirResult<ObjectEntry> {
        let entries = self.entries()?;
        let count = entries.len() as u64;
        usize::try_from(index)
            .ok()
            .and_then(|i| entries.into_iter().nth(i))
            .ok_or(DirError::OutOfBounds { index, count })
    }

    /// First child whose `key` attribute is the string `value`.
    ///
    /// This is a linear scan reading one attribute record per child; it is
    /// the only secondary lookup a directory offers. Children whose record
    /// is missing (including dangling links) are skipped.
    pub fn find_by_name_or_attribute(&self, key: &str, value: &str) -> DirResult<Option<ObjectEntry>> {
        for entry in self.entries()? {
            let attrs = AttributeStore::new(&entry.path, self.mode());
            match attrs.get_attr::<serde_json::Value>(key)? {
                Some(serde_json::Value::String(stored)) if stored == value => {
                    return Ok(Some(entry));
                }
                Some(_) => {}
                None if entry.is_link => {
                    warn!(link = %entry.path.display(), "skipping dangling link during scan");
                }
                None => {}
            }
        }
        Ok(None)
    }

    /// Create an empty child directory named `id`.
    pub fn create_subdir(&self, id: &str) -> DirResult<PathBuf> {
        self.require_writable()?;
        validate_key(id)?;
        let path = self.child_path(id);
        fs::create_dir_all(&path)?;
        debug!(location = %self.location.display(), id, "subdirectory created");
        Ok(path)
    }

    /// Create a child named `link_name` aliasing the directory at `target`.
    ///
    /// Returns `Ok(true)` if a link was created and `Ok(false)` if an entry
    /// with that name already existed, in which case nothing is touched.
    pub fn create_directory_link(&self, target: &Path, link_name: &str) -> DirResult<bool> {
        self.require_writable()?;
        validate_key(link_name)?;
        let link_path = self.child_path(link_name);

        if fs::symlink_metadata(&link_path).is_ok() {
            let existing = fs::canonicalize(&link_path).ok();
            let wanted = fs::canonicalize(target).ok();
            if existing.is_none() || existing != wanted {
                warn!(
                    link = %link_path.display(),
                    target = %target.display(),
                    "entry already exists but does not alias the requested target"
                );
            }
            return Ok(false);
        }

        let target = fs::canonicalize(target).map_err(|_| DirError::LinkTarget(target.to_path_buf()))?;
        if !target.is_dir() {
            return Err(DirError::LinkTarget(target));
        }
        let link_content = if self.options.relative_links {
            let base = fs::canonicalize(&self.location)?;
            pathdiff::diff_paths(&target, &base).ok_or_else(|| DirError::LinkTarget(target.clone()))?
        } else {
            target.clone()
        };

        make_link(&link_content, &link_path)?;
        debug!(link = %link_path.display(), target = %target.display(), "link created");
        Ok(true)
    }

    /// Remove the child named `id`. Links are unlinked; owned directories
    /// are deleted recursively. Returns `true` if the child existed.
    pub fn remove_object(&self, id: &str) -> DirResult<bool> {
        self.require_writable()?;
        if !is_valid_key(id) {
            return Ok(false);
        }
        let path = self.child_path(id);
        let meta = match fs::symlink_metadata(&path) {
            Ok(meta) => meta,
            Err(e) if is_missing(&e) => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        if meta.file_type().is_symlink() {
            remove_link(&path)?;
            debug!(link = %path.display(), "link removed");
        } else if meta.is_dir() {
            fs::remove_dir_all(&path)?;
            debug!(path = %path.display(), "directory removed");
        } else {
            return Ok(false);
        }
        Ok(true)
    }

    /// Remove the child located by `key` = `value`.
    ///
    /// With `key == "id"` an exact child name is tried first; otherwise, or
    /// when that misses, the attribute scan of
    /// [`find_by_name_or_attribute`](Self::find_by_name_or_attribute)
    /// locates the child.
    pub fn remove_object_by_name_or_attribute(&self, key: &str, value: &str) -> DirResult<bool> {
        self.require_writable()?;
        if key == ID_KEY && self.has_object(value)? {
            return self.remove_object(value);
        }
        match self.find_by_name_or_attribute(key, value)? {
            Some(entry) => self.remove_object(&entry.id),
            None => Ok(false),
        }
    }

    /// Links whose target no longer exists.
    pub fn dangling_links(&self) -> DirResult<Vec<ObjectEntry>> {
        let mut dangling = Vec::new();
        for entry in self.entries()? {
            if entry.is_dangling()? {
                dangling.push(entry);
            }
        }
        Ok(dangling)
    }

    fn require_writable(&self) -> DirResult<()> {
        if self.mode().is_writable() {
            Ok(())
        } else {
            Err(DirError::ReadOnly)
        }
    }
}

#[cfg(unix)]
fn make_link(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn make_link(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

#[cfg(unix)]
fn remove_link(link: &Path) -> io::Result<()> {
    fs::remove_file(link)
}

#[cfg(windows)]
fn remove_link(link: &Path) -> io::Result<()> {
    fs::remove_dir(link).or_else(|_| fs::remove_file(link))
}
