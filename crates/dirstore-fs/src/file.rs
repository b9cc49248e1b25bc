//! The root container of a store.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dirstore_directory::{DirOptions, Directory};
use dirstore_types::{FileMode, IdGenerator, Identity, ObjectType};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::block::BlockFs;
use crate::config::StoreConfig;
use crate::entity::{CREATED_KEY, UPDATED_KEY};
use crate::error::{FsError, FsResult};
use crate::owned::OwnedCollection;

/// Value of the root `format` record.
pub const FORMAT: &str = "dirstore";

/// Layout version written by this crate. Stores with a different major
/// version are refused.
pub const VERSION: [u32; 3] = [1, 0, 0];

const FORMAT_KEY: &str = "format";
const VERSION_KEY: &str = "version";

/// An open store: a root directory with format records and a `data`
/// collection of blocks.
#[derive(Clone, Debug)]
pub struct FileFs {
    root: Directory,
    config: StoreConfig,
    blocks: OwnedCollection,
}

impl FileFs {
    /// Open or create the store at `location` as `config` describes.
    pub fn open(location: impl Into<PathBuf>, config: StoreConfig) -> FsResult<Self> {
        let ids = Arc::new(config.id_generator());
        Self::open_with_ids(location, config, ids)
    }

    /// Like [`open`](Self::open) with an explicit id generator.
    pub fn open_with_ids(
        location: impl Into<PathBuf>,
        config: StoreConfig,
        ids: Arc<dyn IdGenerator>,
    ) -> FsResult<Self> {
        let location = location.into();
        match config.mode {
            FileMode::ReadOnly if !location.is_dir() => return Err(FsError::NotFound(location)),
            FileMode::Overwrite if location.exists() => truncate_store(&location)?,
            _ => {}
        }

        let options = config.dir_options();
        let root = Directory::open(&location, options)?;
        match root.get_attr::<String>(FORMAT_KEY)? {
            Some(format) if format == FORMAT => check_version(&root)?,
            Some(other) => {
                return Err(FsError::IncompatibleFormat {
                    location,
                    found: other,
                })
            }
            None if options.mode.is_writable() => {
                let now = Utc::now();
                root.set_attr(FORMAT_KEY, FORMAT)?;
                root.set_attr(VERSION_KEY, &VERSION)?;
                root.set_attr(CREATED_KEY, &now)?;
                root.set_attr(UPDATED_KEY, &now)?;
                info!(location = %location.display(), "store created");
            }
            None => {
                return Err(FsError::IncompatibleFormat {
                    location,
                    found: "no format record".to_string(),
                })
            }
        }

        let blocks = OwnedCollection::open(&location, ObjectType::Block, ObjectType::Block, options, ids)?;
        info!(location = %location.display(), mode = %config.mode, "store opened");
        Ok(Self { root, config, blocks })
    }

    pub fn location(&self) -> &Path {
        self.root.location()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn format(&self) -> FsResult<Option<String>> {
        Ok(self.root.get_attr(FORMAT_KEY)?)
    }

    pub fn version(&self) -> FsResult<Option<[u32; 3]>> {
        Ok(self.root.get_attr(VERSION_KEY)?)
    }

    pub fn created_at(&self) -> FsResult<Option<DateTime<Utc>>> {
        Ok(self.root.get_attr(CREATED_KEY)?)
    }

    pub fn updated_at(&self) -> FsResult<Option<DateTime<Utc>>> {
        Ok(self.root.get_attr(UPDATED_KEY)?)
    }

    pub fn create_block(&self, name: &str, kind: &str) -> FsResult<BlockFs> {
        let entity = self.blocks.create(name, kind)?;
        self.touch()?;
        BlockFs::from_entity(entity, self.blocks.ids().clone())
    }

    pub fn has_block(&self, ident: &Identity) -> FsResult<bool> {
        self.blocks.has(ident)
    }

    pub fn get_block(&self, ident: &Identity) -> FsResult<Option<BlockFs>> {
        match self.blocks.resolve(ident)? {
            Some(entry) => self.open_block(entry.path).map(Some),
            None => Ok(None),
        }
    }

    pub fn get_block_at(&self, index: u64) -> FsResult<Option<BlockFs>> {
        let id = self.blocks.entry_at(index)?.map(|e| e.id).unwrap_or_default();
        self.get_block(&Identity::by_id(id, ObjectType::Block))
    }

    pub fn block_count(&self) -> FsResult<u64> {
        self.blocks.count()
    }

    /// Delete a block and everything it owns.
    pub fn remove_block(&self, ident: &Identity) -> FsResult<bool> {
        let removed = self.blocks.remove(ident)?;
        if removed {
            self.touch()?;
        }
        Ok(removed)
    }

    pub fn blocks(&self) -> FsResult<Vec<BlockFs>> {
        self.blocks
            .entries()?
            .into_iter()
            .map(|entry| self.open_block(entry.path))
            .collect()
    }

    /// Every link in the store whose target no longer exists.
    pub fn find_dangling_links(&self) -> FsResult<Vec<PathBuf>> {
        let mut dangling = Vec::new();
        for entry in WalkDir::new(self.location()).follow_links(false) {
            let entry = entry.map_err(walk_error)?;
            if entry.path_is_symlink() && fs::metadata(entry.path()).is_err() {
                dangling.push(entry.into_path());
            }
        }
        dangling.sort();
        Ok(dangling)
    }

    fn open_block(&self, path: PathBuf) -> FsResult<BlockFs> {
        BlockFs::open(path, self.options(), self.blocks.ids().clone())
    }

    fn options(&self) -> DirOptions {
        self.root.options()
    }

    fn touch(&self) -> FsResult<()> {
        Ok(self.root.set_attr(UPDATED_KEY, &Utc::now())?)
    }
}

/// Delete an existing store so it can be recreated. Only empty directories
/// and directories carrying our `format` record qualify; anything else is
/// left untouched.
fn truncate_store(location: &Path) -> FsResult<()> {
    let existing = Directory::open(location, DirOptions::with_mode(FileMode::ReadOnly))?;
    if fs::read_dir(location)?.next().is_none() {
        return Ok(());
    }
    match existing.get_attr::<String>(FORMAT_KEY)? {
        Some(format) if format == FORMAT => {
            fs::remove_dir_all(location)?;
            debug!(location = %location.display(), "existing store truncated");
            Ok(())
        }
        found => Err(FsError::IncompatibleFormat {
            location: location.to_path_buf(),
            found: found.unwrap_or_else(|| "no format record".to_string()),
        }),
    }
}

fn walk_error(err: walkdir::Error) -> FsError {
    let message = err.to_string();
    FsError::Io(err.into_io_error().unwrap_or_else(|| io::Error::other(message)))
}

fn check_version(root: &Directory) -> FsResult<()> {
    let version: Option<[u32; 3]> = root.get_attr(VERSION_KEY)?;
    match version {
        Some([major, _, _]) if major == VERSION[0] => Ok(()),
        Some(found) => Err(FsError::IncompatibleFormat {
            location: root.location().to_path_buf(),
            found: format!("version {}.{}.{}", found[0], found[1], found[2]),
        }),
        None => Err(FsError::IncompatibleFormat {
            location: root.location().to_path_buf(),
            found: "no version record".to_string(),
        }),
    }
}
