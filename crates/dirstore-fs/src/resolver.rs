//! Identity resolution: from an (id, name, type) triple to an on-disk entry.

use dirstore_directory::{AttributeStore, Directory, ObjectEntry, NAME_KEY};
use dirstore_types::Identity;
use tracing::debug;

use crate::error::FsResult;

/// Resolve `ident` within `dir`.
///
/// The id is tried first as an exact child name; the `name` record is only
/// consulted when the identity carries a name. A lookup by id alone never
/// reads any attribute. When both keys are given they must describe the
/// same entity, otherwise the identity does not resolve.
pub fn resolve(dir: &Directory, ident: &Identity) -> FsResult<Option<ObjectEntry>> {
    let Some(key) = ident.preferred_key() else {
        return Ok(None);
    };

    let candidate = match dir.entry(key)? {
        Some(entry) => Some(entry),
        None => match ident.name() {
            Some(name) => dir.find_by_name_or_attribute(NAME_KEY, name)?,
            None => None,
        },
    };
    let Some(entry) = candidate else {
        return Ok(None);
    };

    if let (Some(id), Some(name)) = (ident.id(), ident.name()) {
        if entry.id != id {
            debug!(%ident, found = %entry.id, "id and name resolve to different entities");
            return Ok(None);
        }
        let stored: Option<String> = AttributeStore::new(&entry.path, dir.mode()).get_attr(NAME_KEY)?;
        if stored.as_deref() != Some(name) {
            debug!(%ident, stored = ?stored, "stored name differs from requested name");
            return Ok(None);
        }
    }
    Ok(Some(entry))
}
