//! # Per-Type Default Catalog
//!
//! The catalog maps record types to their [`DefaultRegistry`] and is the
//! entry point for both declaring defaults and building instances.
//!
//! ## Installation
//!
//! A type is *installed* the first time it declares a default. Installation
//! happens exactly once per type: later declarations, from any call site,
//! reuse the same entry and only publish a new registry snapshot. Types that
//! never declare anything are not installed and are built through the plain
//! base constructor.
//!
//! ## Inheritance
//!
//! A type inherits the effective registry of its nearest installed ancestor
//! (see [`Record::parent_type`]). When an uninstalled subtype declares its
//! first default, it is seeded with a copy of that ancestor's entries and
//! from then on evolves independently.
//!
//! ## Snapshots
//!
//! Each installed type holds its registry in an [`ArcSwap`]. Declaring
//! clones the current snapshot, applies the change and swaps the new one in,
//! so constructions running concurrently always see a complete registry.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use arc_swap::ArcSwap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::config::DefaultsConfig;
use crate::error::{BoxError, DefaultsError, Result};
use crate::interceptor::ConstructionInterceptor;
use crate::record::{BuildOptions, Record, TypeKey};
use crate::registry::DefaultRegistry;
use crate::source::{RecordView, ValueSource};
use crate::value::{AttrValue, InputMap};

static GLOBAL: Lazy<DefaultsCatalog> = Lazy::new(|| {
    let config = DefaultsConfig::from_env().unwrap_or_else(|err| {
        warn!(%err, "invalid attrdefaults environment config, using defaults");
        DefaultsConfig::default()
    });
    DefaultsCatalog::new(config)
});

struct TypeDefaults {
    key: TypeKey,
    snapshot: ArcSwap<DefaultRegistry>,
}

type TypeMap = HashMap<TypeKey, Arc<TypeDefaults>>;

pub struct DefaultsCatalog {
    config: DefaultsConfig,
    types: RwLock<TypeMap>,
}

impl Default for DefaultsCatalog {
    fn default() -> Self {
        Self::new(DefaultsConfig::default())
    }
}

impl DefaultsCatalog {
    pub fn new(config: DefaultsConfig) -> Self {
        Self {
            config,
            types: RwLock::new(HashMap::new()),
        }
    }

    /// Process-wide catalog, configured from the environment.
    pub fn global() -> &'static DefaultsCatalog {
        &GLOBAL
    }

    pub fn config(&self) -> &DefaultsConfig {
        &self.config
    }

    /// Declare (or redeclare) the default for one attribute of `R`.
    pub fn declare_default<R: Record>(
        &self,
        attribute: impl Into<String>,
        source: impl Into<ValueSource>,
    ) {
        let attribute: String = attribute.into();
        let source: ValueSource = source.into();
        self.declare_defaults::<R, _, _, _>([(attribute, source)]);
    }

    /// Declare several defaults for `R`, published as a single snapshot.
    pub fn declare_defaults<R, I, K, S>(&self, mapping: I)
    where
        R: Record,
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: Into<ValueSource>,
    {
        let declared: Vec<(String, ValueSource)> = mapping
            .into_iter()
            .map(|(k, s)| (k.into(), s.into()))
            .collect();
        if declared.is_empty() {
            return;
        }

        let entry = self.install::<R>();
        entry.snapshot.rcu(|current| {
            let mut next = DefaultRegistry::clone(current);
            next.declare_many(declared.iter().cloned());
            next
        });
        debug!(
            record = entry.key.name(),
            attributes = ?declared.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
            "declared attribute defaults"
        );
    }

    /// Effective registry for `R`: its own, or its nearest installed ancestor's.
    pub fn registry<R: Record>(&self) -> Option<Arc<DefaultRegistry>> {
        self.registry_for(TypeKey::of::<R>())
    }

    pub fn registry_for(&self, key: TypeKey) -> Option<Arc<DefaultRegistry>> {
        effective(&self.types.read(), Some(key))
    }

    /// Whether `R` itself has declared defaults.
    pub fn is_installed<R: Record>(&self) -> bool {
        self.types.read().contains_key(&TypeKey::of::<R>())
    }

    pub fn installed_types(&self) -> Vec<TypeKey> {
        self.types.read().keys().copied().collect()
    }

    /// Interceptor over the current snapshot, or `None` when `R` has no
    /// effective defaults.
    pub fn interceptor<R: Record>(&self) -> Option<ConstructionInterceptor> {
        self.registry::<R>().map(|registry| {
            ConstructionInterceptor::new(
                registry,
                self.config.key_match,
                self.config.default_role.clone(),
            )
        })
    }

    pub fn build<R: Record>(&self, input: Option<&InputMap>, options: &BuildOptions) -> Result<R> {
        self.build_with(input, options, |_| {})
    }

    /// Build a new `R`, apply its defaults, then run `hook` on the instance.
    pub fn build_with<R, F>(
        &self,
        input: Option<&InputMap>,
        options: &BuildOptions,
        hook: F,
    ) -> Result<R>
    where
        R: Record,
        F: FnOnce(&mut R),
    {
        match self.interceptor::<R>() {
            Some(interceptor) => interceptor.construct_with(input, options, hook),
            None => {
                let mut instance = R::construct(input, options)
                    .map_err(DefaultsError::Construction)?;
                hook(&mut instance);
                Ok(instance)
            }
        }
    }

    fn install<R: Record>(&self) -> Arc<TypeDefaults> {
        let key = TypeKey::of::<R>();
        if let Some(existing) = self.types.read().get(&key) {
            return existing.clone();
        }

        let mut types = self.types.write();
        if let Some(existing) = types.get(&key) {
            return existing.clone();
        }
        let seed = effective(&types, R::parent_type())
            .map(|parent| DefaultRegistry::inherits_from(&parent))
            .unwrap_or_default();
        debug!(
            record = key.name(),
            inherited = seed.len(),
            "installing default interceptor"
        );
        let entry = Arc::new(TypeDefaults {
            key,
            snapshot: ArcSwap::from_pointee(seed),
        });
        types.insert(key, entry.clone());
        entry
    }
}

/// Walk from `start` up the parent chain to the first installed type.
fn effective(types: &TypeMap, start: Option<TypeKey>) -> Option<Arc<DefaultRegistry>> {
    let mut visited = HashSet::new();
    let mut next = start;
    while let Some(key) = next {
        if !visited.insert(key) {
            warn!(record = key.name(), "cycle in record parent chain");
            return None;
        }
        if let Some(entry) = types.get(&key) {
            return Some(entry.snapshot.load_full());
        }
        next = key.parent();
    }
    None
}

/// Declaration and construction API on record types, backed by
/// [`DefaultsCatalog::global`].
pub trait DefaultValueFor: Record {
    fn default_value_for(attribute: impl Into<String>, value: impl Into<AttrValue>) {
        DefaultsCatalog::global()
            .declare_default::<Self>(attribute, ValueSource::literal(value));
    }

    fn default_value_for_with<F>(attribute: impl Into<String>, producer: F)
    where
        F: Fn(&dyn RecordView) -> std::result::Result<AttrValue, BoxError> + Send + Sync + 'static,
    {
        DefaultsCatalog::global()
            .declare_default::<Self>(attribute, ValueSource::function(producer));
    }

    fn default_values<I, K, S>(mapping: I)
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: Into<ValueSource>,
    {
        DefaultsCatalog::global().declare_defaults::<Self, _, _, _>(mapping);
    }

    fn build_defaulted(input: Option<&InputMap>, options: &BuildOptions) -> Result<Self> {
        DefaultsCatalog::global().build(input, options)
    }

    fn build_defaulted_with<F>(
        input: Option<&InputMap>,
        options: &BuildOptions,
        hook: F,
    ) -> Result<Self>
    where
        F: FnOnce(&mut Self),
    {
        DefaultsCatalog::global().build_with(input, options, hook)
    }
}

impl<R: Record> DefaultValueFor for R {}
