//! Collaborator seams provided by the host record type.
//!
//! The record base type owns construction, attribute storage, change
//! tracking and mass-assignment authorization. This crate only calls into
//! them through [`Record`].

use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::BoxError;
use crate::source::RecordView;
use crate::value::{AttrValue, InputMap};

/// Identity of a record type, used to key per-type registries.
///
/// The key also remembers how to reach the type's parent, so the catalog can
/// walk an inheritance chain through types that never declared anything.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
    parent: fn() -> Option<TypeKey>,
}

impl TypeKey {
    pub fn of<T: Record>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            parent: T::parent_type,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parent(&self) -> Option<TypeKey> {
        (self.parent)()
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Options forwarded to the base constructor and the authorizer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Mass-assignment role. `None` selects the configured default role.
    pub role: Option<String>,
}

impl BuildOptions {
    pub fn as_role(role: impl Into<String>) -> Self {
        Self {
            role: Some(role.into()),
        }
    }

    /// The role to authorize with, falling back to `default_role`.
    pub fn role_or<'a>(&'a self, default_role: &'a str) -> &'a str {
        self.role.as_deref().unwrap_or(default_role)
    }
}

/// A persistent-record type whose new instances can receive defaults.
pub trait Record: RecordView + Sized + Send + Sync + 'static {
    /// Base construction, run with defaulting disabled.
    fn construct(input: Option<&InputMap>, options: &BuildOptions) -> Result<Self, BoxError>;

    /// Assign an attribute. Unknown names must fail.
    fn write_attribute(&mut self, name: &str, value: AttrValue) -> Result<(), BoxError>;

    /// Forget any pending change recorded for `name`.
    fn discard_pending_change(&mut self, name: &str);

    /// Whether mass assignment of `key` is denied for `role`.
    fn is_key_denied(&self, _key: &str, _role: &str) -> Result<bool, BoxError> {
        Ok(false)
    }

    /// Supertype whose declared defaults this type inherits.
    fn parent_type() -> Option<TypeKey> {
        None
    }
}
