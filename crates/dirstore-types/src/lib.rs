//! Foundation types for dirstore.
//!
//! This crate provides the small vocabulary shared by every other dirstore
//! crate: which kinds of entities exist, how a caller addresses one, how a
//! store is opened, and where fresh entity ids come from.
//!
//! # Key Types
//!
//! - [`ObjectType`]: The declared type of a persisted entity
//! - [`Identity`]: An (id, name, type) descriptor used for lookups
//! - [`FileMode`]: Whether a store may be mutated
//! - [`IdGenerator`]: Source of opaque, sufficiently unique entity ids

pub mod error;
pub mod id;
pub mod identity;
pub mod mode;
pub mod object_type;

pub use error::TypeError;
pub use id::{IdGenerator, UuidGenerator};
pub use identity::Identity;
pub use mode::FileMode;
pub use object_type::ObjectType;
