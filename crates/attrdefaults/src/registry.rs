//! Per-type default declarations.
//!
//! A [`DefaultRegistry`] is an ordered mapping from attribute name to
//! [`ValueSource`]. Registries are treated as immutable snapshots once
//! published: the catalog clones the current snapshot, declares into the
//! clone and swaps it in, so parent and sibling types never observe each
//! other's changes.

use indexmap::IndexMap;

use crate::source::ValueSource;

#[derive(Debug, Clone, Default)]
pub struct DefaultRegistry {
    entries: IndexMap<String, ValueSource>,
}

impl DefaultRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a registry with a copy of `parent`'s entries.
    ///
    /// Declarations made on the result override parent entries by name and
    /// leave the rest in place.
    pub fn inherits_from(parent: &DefaultRegistry) -> Self {
        parent.clone()
    }

    /// Register or replace the source for `attribute`.
    ///
    /// A replaced entry keeps its original position so application order
    /// stays stable across redeclarations.
    pub fn declare(&mut self, attribute: impl Into<String>, source: impl Into<ValueSource>) {
        self.entries.insert(attribute.into(), source.into());
    }

    /// Batch form of [`declare`](Self::declare).
    pub fn declare_many<I, K, S>(&mut self, mapping: I)
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: Into<ValueSource>,
    {
        for (attribute, source) in mapping {
            self.declare(attribute, source);
        }
    }

    /// Effective declarations in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &ValueSource)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn get(&self, attribute: &str) -> Option<&ValueSource> {
        self.entries.get(attribute)
    }

    pub fn contains(&self, attribute: &str) -> bool {
        self.entries.contains_key(attribute)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, S: Into<ValueSource>> FromIterator<(K, S)> for DefaultRegistry {
    fn from_iter<I: IntoIterator<Item = (K, S)>>(iter: I) -> Self {
        let mut registry = DefaultRegistry::new();
        registry.declare_many(iter);
        registry
    }
}
