//! Non-owning relations: collections of links into a block's entities.

use std::collections::BTreeSet;
use std::sync::Arc;

use dirstore_directory::{AttributeStore, Directory, ObjectEntry, ID_KEY, NAME_KEY};
use dirstore_types::{Identity, ObjectType};
use tracing::{debug, warn};

use crate::block::BlockScope;
use crate::entity::EntityFs;
use crate::error::{FsError, FsResult};
use crate::owned::{self, OwnedCollection};
use crate::reconcile::{self, Member, ReconcileReport};
use crate::resolver;

/// A directory of links, each aliasing an entity owned by the block.
///
/// Every link is named by the id of the entity it points at. Adding checks
/// that the block owns the entity; removing only ever unlinks.
#[derive(Clone, Debug)]
pub struct LinkCollection {
    dir: Directory,
    target_type: ObjectType,
    scope: Arc<BlockScope>,
}

impl LinkCollection {
    /// Open (creating if writable) the link directory `name` inside `parent`.
    pub fn open(parent: &EntityFs, name: &str, target_type: ObjectType, scope: Arc<BlockScope>) -> FsResult<Self> {
        Ok(Self {
            dir: parent.sub_directory(name)?,
            target_type,
            scope,
        })
    }

    pub fn directory(&self) -> &Directory {
        &self.dir
    }

    pub fn target_type(&self) -> ObjectType {
        self.target_type
    }

    pub fn scope(&self) -> &Arc<BlockScope> {
        &self.scope
    }

    /// Resolve an identity among the linked entities.
    pub fn resolve(&self, ident: &Identity) -> FsResult<Option<ObjectEntry>> {
        if ident.object_type() != self.target_type {
            return Ok(None);
        }
        resolver::resolve(&self.dir, ident)
    }

    /// Like [`resolve`](Self::resolve), but a link whose target is gone is
    /// absent.
    pub fn resolve_live(&self, ident: &Identity) -> FsResult<Option<ObjectEntry>> {
        match self.resolve(ident)? {
            Some(entry) if entry.is_dangling()? => {
                warn!(link = %entry.path.display(), "dangling link ignored");
                Ok(None)
            }
            found => Ok(found),
        }
    }

    /// Returns `true` if `ident` resolves to a link with a live target.
    pub fn has(&self, ident: &Identity) -> FsResult<bool> {
        Ok(self.resolve_live(ident)?.is_some())
    }

    /// Number of links, dangling ones included.
    pub fn count(&self) -> FsResult<u64> {
        Ok(self.dir.subdir_count()?)
    }

    pub fn entry_at(&self, index: u64) -> FsResult<Option<ObjectEntry>> {
        owned::entry_at(&self.dir, index)
    }

    pub fn entries(&self) -> FsResult<Vec<ObjectEntry>> {
        Ok(self.dir.entries()?)
    }

    /// Links whose targets still exist, sorted by id.
    pub fn live_entries(&self) -> FsResult<Vec<ObjectEntry>> {
        let mut live = Vec::new();
        for entry in self.dir.entries()? {
            if entry.is_dangling()? {
                warn!(link = %entry.path.display(), "skipping dangling link");
            } else {
                live.push(entry);
            }
        }
        Ok(live)
    }

    pub fn ids(&self) -> FsResult<Vec<String>> {
        Ok(self.dir.object_ids()?)
    }

    /// Link the block-owned entity `ident` resolves to.
    ///
    /// Returns `Ok(false)` if it was already linked. Fails with
    /// [`FsError::EntityNotInBlock`] if the block does not own it.
    pub fn add(&self, ident: &Identity) -> FsResult<bool> {
        let entry = self.owned_entry(ident)?;
        let added = self.dir.create_directory_link(&entry.path, &entry.id)?;
        if added {
            debug!(collection = %self.dir.location().display(), id = %entry.id, "entity linked");
        }
        Ok(added)
    }

    /// Unlink `ident`. With an id present only the id is used; otherwise the
    /// link is located by name. The target entity is never touched.
    pub fn remove(&self, ident: &Identity) -> FsResult<bool> {
        ident.require_key()?;
        if ident.object_type() != self.target_type {
            return Ok(false);
        }
        let removed = match (ident.id(), ident.name()) {
            (Some(id), _) => self.dir.remove_object_by_name_or_attribute(ID_KEY, id)?,
            (None, Some(name)) => self.dir.remove_object_by_name_or_attribute(NAME_KEY, name)?,
            (None, None) => false,
        };
        if removed {
            debug!(collection = %self.dir.location().display(), %ident, "entity unlinked");
        }
        Ok(removed)
    }

    /// Unlink everything.
    pub fn clear(&self) -> FsResult<u64> {
        let mut removed = 0;
        for entry in self.dir.entries()? {
            if self.dir.remove_object(&entry.id)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Current members ordered by name, then id.
    ///
    /// A dangling link has no readable name and is reported with an empty
    /// one, so reconciliation removes it.
    pub fn members(&self) -> FsResult<BTreeSet<Member>> {
        let mut members = BTreeSet::new();
        for entry in self.dir.entries()? {
            let name: Option<String> = AttributeStore::new(&entry.path, self.dir.mode()).get_attr(NAME_KEY)?;
            if name.is_none() {
                warn!(link = %entry.path.display(), "link without a readable name");
            }
            members.insert(Member::new(name.unwrap_or_default(), entry.id));
        }
        Ok(members)
    }

    /// Make the linked set equal `targets`.
    ///
    /// Every target is checked against the block (matching id and name)
    /// before anything is changed. Members in both sets are left alone.
    pub fn set(&self, targets: &[Identity]) -> FsResult<ReconcileReport> {
        let mut wanted = BTreeSet::new();
        let mut paths = Vec::with_capacity(targets.len());
        for ident in targets {
            let entry = self.owned_entry(ident)?;
            let name: Option<String> = AttributeStore::new(&entry.path, self.dir.mode()).get_attr(NAME_KEY)?;
            let member = Member::new(name.unwrap_or_default(), entry.id.clone());
            paths.push((member.clone(), entry.path));
            wanted.insert(member);
        }

        let report = reconcile::plan(&self.members()?, &wanted);
        for member in &report.removed {
            self.dir.remove_object(&member.id)?;
        }
        for member in &report.added {
            if let Some((_, path)) = paths.iter().find(|(m, _)| m == member) {
                self.dir.create_directory_link(path, &member.id)?;
            }
        }
        if !report.is_unchanged() {
            debug!(
                collection = %self.dir.location().display(),
                added = report.added.len(),
                removed = report.removed.len(),
                "links reconciled"
            );
        }
        Ok(report)
    }

    fn source(&self) -> FsResult<&OwnedCollection> {
        self.scope.collection(self.target_type).ok_or(FsError::NoCollection {
            owner: ObjectType::Block,
            requested: self.target_type,
        })
    }

    fn owned_entry(&self, ident: &Identity) -> FsResult<ObjectEntry> {
        if ident.object_type() != self.target_type {
            return Err(FsError::TypeMismatch {
                expected: self.target_type,
                actual: ident.object_type(),
            });
        }
        self.source()?
            .resolve(ident)?
            .ok_or_else(|| FsError::EntityNotInBlock(ident.clone()))
    }
}

/// A relation holding at most one link.
#[derive(Clone, Debug)]
pub struct SingleLink {
    links: LinkCollection,
}

impl SingleLink {
    pub fn open(parent: &EntityFs, name: &str, target_type: ObjectType, scope: Arc<BlockScope>) -> FsResult<Self> {
        Ok(Self {
            links: LinkCollection::open(parent, name, target_type, scope)?,
        })
    }

    pub fn get(&self) -> FsResult<Option<ObjectEntry>> {
        self.links.entry_at(0)
    }

    pub fn is_set(&self) -> FsResult<bool> {
        Ok(self.links.count()? > 0)
    }

    /// Point the relation at `ident`, replacing any previous target.
    pub fn set(&self, ident: &Identity) -> FsResult<()> {
        self.links.set(std::slice::from_ref(ident))?;
        Ok(())
    }

    /// Drop the link. Returns `true` if one existed.
    pub fn clear(&self) -> FsResult<bool> {
        Ok(self.links.clear()? > 0)
    }
}
