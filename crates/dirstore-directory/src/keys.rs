//! Validation of names that become single directory entries.
//!
//! Both attribute keys and child ids end up as one path component, so they
//! share the same rules:
//! - Must be non-empty
//! - Must not contain `/`, `\` or NUL
//! - Must not start with `.` (hidden entries are reserved for bookkeeping)

use crate::error::{DirError, DirResult};

const FORBIDDEN_CHARS: &[char] = &['/', '\\', '\0'];

/// Validate a key, returning `Ok(())` if it can be stored as an entry name.
///
/// ```
/// use dirstore_directory::keys::validate_key;
///
/// assert!(validate_key("name").is_ok());
/// assert!(validate_key("").is_err());
/// assert!(validate_key("../escape").is_err());
/// assert!(validate_key(".attributes").is_err());
/// ```
pub fn validate_key(key: &str) -> DirResult<()> {
    if key.is_empty() {
        return Err(invalid(key, "must not be empty"));
    }
    if let Some(ch) = key.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(invalid(key, &format!("contains forbidden character: {ch:?}")));
    }
    if key.starts_with('.') {
        return Err(invalid(key, "must not start with '.'"));
    }
    Ok(())
}

/// Returns `true` if `key` passes [`validate_key`].
pub fn is_valid_key(key: &str) -> bool {
    validate_key(key).is_ok()
}

fn invalid(key: &str, reason: &str) -> DirError {
    DirError::InvalidKey {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
