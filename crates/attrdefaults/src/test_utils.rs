//! Fixture record types for tests.
//!
//! [`Fixture<K>`] is a minimal record with a fixed attribute schema, change
//! tracking and a mass-assignment policy. Each marker `K` yields a distinct
//! record type, so tests can declare defaults on their own types without
//! stepping on each other in the global catalog.

use std::collections::HashMap;
use std::marker::PhantomData;

use indexmap::{IndexMap, IndexSet};

use crate::error::BoxError;
use crate::record::{BuildOptions, Record, TypeKey};
use crate::source::RecordView;
use crate::value::{AttrValue, InputMap};

/// Role that makes the authorizer fail, simulating an unreachable policy.
pub const OFFLINE_ROLE: &str = "offline";

/// Role allowed to assign protected attributes.
pub const ADMIN_ROLE: &str = "admin";

/// Input key that makes base construction fail.
pub const FAIL_KEY: &str = "fail";

/// Describes one fixture record type.
pub trait FixtureKind: Send + Sync + 'static {
    const SCHEMA: &'static [&'static str];

    /// Attributes only [`ADMIN_ROLE`] may mass-assign.
    const PROTECTED: &'static [&'static str] = &["state"];

    fn parent() -> Option<TypeKey> {
        None
    }
}

/// Attribute storage with change tracking.
#[derive(Debug, Default)]
pub struct AttributeStore {
    schema: &'static [&'static str],
    values: IndexMap<String, AttrValue>,
    changed: IndexSet<String>,
    writes: HashMap<String, usize>,
}

impl AttributeStore {
    pub fn new(schema: &'static [&'static str]) -> Self {
        Self {
            schema,
            ..Default::default()
        }
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.values.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut AttrValue> {
        self.values.get_mut(name)
    }

    pub fn write(&mut self, name: &str, value: AttrValue) -> Result<(), BoxError> {
        if !self.schema.iter().any(|known| *known == name) {
            return Err(format!("unknown attribute `{name}`").into());
        }
        self.values.insert(name.to_string(), value);
        self.changed.insert(name.to_string());
        *self.writes.entry(name.to_string()).or_default() += 1;
        Ok(())
    }

    pub fn discard_change(&mut self, name: &str) {
        self.changed.shift_remove(name);
    }

    pub fn is_changed(&self, name: &str) -> bool {
        self.changed.contains(name)
    }

    pub fn changed(&self) -> impl Iterator<Item = &str> {
        self.changed.iter().map(String::as_str)
    }

    pub fn write_count(&self, name: &str) -> usize {
        self.writes.get(name).copied().unwrap_or(0)
    }
}

pub struct Fixture<K> {
    pub store: AttributeStore,
    _kind: PhantomData<fn() -> K>,
}

impl<K: FixtureKind> Fixture<K> {
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.store.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut AttrValue> {
        self.store.get_mut(name)
    }

    pub fn is_changed(&self, name: &str) -> bool {
        self.store.is_changed(name)
    }

    pub fn write_count(&self, name: &str) -> usize {
        self.store.write_count(name)
    }

    fn protected(key: &str, role: &str) -> bool {
        role != ADMIN_ROLE
            && K::PROTECTED.iter().any(|attr| {
                key == *attr || key.strip_prefix(attr).is_some_and(|r| r.starts_with('('))
            })
    }
}

impl<K> std::fmt::Debug for Fixture<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fixture")
            .field("values", &self.store.values)
            .finish()
    }
}

impl<K: FixtureKind> RecordView for Fixture<K> {
    fn read_attribute(&self, name: &str) -> Option<&AttrValue> {
        self.store.get(name)
    }
}

impl<K: FixtureKind> Record for Fixture<K> {
    /// Assigns permitted input keys; multi-parameter keys are left to a
    /// later assembly step and ignored here.
    fn construct(input: Option<&InputMap>, options: &BuildOptions) -> Result<Self, BoxError> {
        let mut store = AttributeStore::new(K::SCHEMA);
        let role = options.role_or("default");
        for (key, value) in input.into_iter().flatten() {
            if key == FAIL_KEY {
                return Err("base construction rejected input".into());
            }
            if Self::protected(key, role) || key.contains('(') {
                continue;
            }
            store.write(key, value.clone())?;
        }
        Ok(Self {
            store,
            _kind: PhantomData,
        })
    }

    fn write_attribute(&mut self, name: &str, value: AttrValue) -> Result<(), BoxError> {
        self.store.write(name, value)
    }

    fn discard_pending_change(&mut self, name: &str) {
        self.store.discard_change(name);
    }

    fn is_key_denied(&self, key: &str, role: &str) -> Result<bool, BoxError> {
        if role == OFFLINE_ROLE {
            return Err("authorizer offline".into());
        }
        Ok(Self::protected(key, role))
    }

    fn parent_type() -> Option<TypeKey> {
        K::parent()
    }
}

pub struct ArticleSchema;

impl FixtureKind for ArticleSchema {
    const SCHEMA: &'static [&'static str] = &[
        "title",
        "slug",
        "state",
        "published_on",
        "tags",
        "settings",
    ];
}

pub type Article = Fixture<ArticleSchema>;

/// Build an [`InputMap`] from literal pairs.
pub fn input(pairs: &[(&str, AttrValue)]) -> InputMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}
