use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::object_type::ObjectType;

/// Descriptor used to address an entity for lookup or removal.
///
/// An identity always carries a type and may carry an id, a name, or both.
/// Empty strings are normalized to "absent" on construction, so an identity
/// built from `""` behaves exactly like one built without that key.
///
/// The id is the authoritative key; the name is the ergonomic one. When
/// both are present, resolvers require them to agree.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    id: Option<String>,
    name: Option<String>,
    object_type: ObjectType,
}

impl Identity {
    /// Create an identity from an id and a name. Either may be empty.
    pub fn new(id: impl Into<String>, name: impl Into<String>, object_type: ObjectType) -> Self {
        Self {
            id: non_empty(id.into()),
            name: non_empty(name.into()),
            object_type,
        }
    }

    /// Identity addressed by id only.
    pub fn by_id(id: impl Into<String>, object_type: ObjectType) -> Self {
        Self::new(id, String::new(), object_type)
    }

    /// Identity addressed by name only.
    pub fn by_name(name: impl Into<String>, object_type: ObjectType) -> Self {
        Self::new(String::new(), name, object_type)
    }

    /// Identity carrying no key at all. Never resolves.
    pub fn empty(object_type: ObjectType) -> Self {
        Self {
            id: None,
            name: None,
            object_type,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    /// Returns `true` if neither an id nor a name is present.
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.name.is_none()
    }

    /// The key tried first during resolution: the id if present, else the name.
    pub fn preferred_key(&self) -> Option<&str> {
        self.id().or_else(|| self.name())
    }

    /// Fail with [`TypeError::EmptyIdentity`] if no key is present.
    pub fn require_key(&self) -> Result<(), TypeError> {
        if self.is_empty() {
            return Err(TypeError::EmptyIdentity(self.object_type.to_string()));
        }
        Ok(())
    }

    /// Same keys, different type.
    pub fn with_type(&self, object_type: ObjectType) -> Self {
        Self {
            object_type,
            ..self.clone()
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{{id={}, name={}}}",
            self.object_type,
            self.id().unwrap_or("-"),
            self.name().unwrap_or("-")
        )
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_strings_are_absent() {
        let ident = Identity::new("", "", ObjectType::DataArray);
        assert!(ident.is_empty());
        assert_eq!(ident, Identity::empty(ObjectType::DataArray));
        assert!(ident.require_key().is_err());
    }

    #[test]
    fn id_is_preferred_over_name() {
        let ident = Identity::new("da1", "voltage", ObjectType::DataArray);
        assert_eq!(ident.preferred_key(), Some("da1"));

        let by_name = Identity::by_name("voltage", ObjectType::DataArray);
        assert_eq!(by_name.preferred_key(), Some("voltage"));
    }

    #[test]
    fn with_type_keeps_keys() {
        let ident = Identity::new("x", "y", ObjectType::Tag).with_type(ObjectType::MultiTag);
        assert_eq!(ident.id(), Some("x"));
        assert_eq!(ident.name(), Some("y"));
        assert_eq!(ident.object_type(), ObjectType::MultiTag);
    }

    #[test]
    fn display_marks_missing_keys() {
        let ident = Identity::by_id("t1", ObjectType::Tag);
        assert_eq!(ident.to_string(), "Tag{id=t1, name=-}");
    }

    proptest! {
        #[test]
        fn preferred_key_is_some_iff_not_empty(id in "[a-z0-9]{0,4}", name in "[a-z]{0,4}") {
            let ident = Identity::new(id.clone(), name.clone(), ObjectType::Group);
            prop_assert_eq!(ident.preferred_key().is_some(), !ident.is_empty());
            prop_assert_eq!(ident.is_empty(), id.is_empty() && name.is_empty());
            if !id.is_empty() {
                prop_assert_eq!(ident.preferred_key(), Some(id.as_str()));
            }
        }
    }
}
