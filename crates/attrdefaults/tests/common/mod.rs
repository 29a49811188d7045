//! A host record type implemented purely against the public API.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::marker::PhantomData;

use attrdefaults::{AttrValue, BoxError, BuildOptions, InputMap, Record, RecordView, TypeKey};

pub const SCHEMA: &[&str] = &[
    "name",
    "email",
    "birthdate",
    "tags",
    "preferences",
    "tier",
    "referral_code",
    "handle",
];

/// Role allowed to mass-assign `tier`.
pub const STAFF_ROLE: &str = "staff";

/// Marker selecting a distinct customer type.
pub trait Kind: Send + Sync + 'static {
    fn parent() -> Option<TypeKey> {
        None
    }
}

pub struct Customer<K> {
    values: HashMap<String, AttrValue>,
    dirty: HashSet<String>,
    assignments: Vec<String>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: Kind> Customer<K> {
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.values.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut AttrValue> {
        self.values.get_mut(name)
    }

    pub fn is_dirty(&self, name: &str) -> bool {
        self.dirty.contains(name)
    }

    /// Every attribute write, in order.
    pub fn assignments(&self) -> &[String] {
        &self.assignments
    }

    fn assign(&mut self, name: &str, value: AttrValue) -> Result<(), BoxError> {
        if !SCHEMA.iter().any(|known| *known == name) {
            return Err(format!("unknown attribute `{name}` for customer").into());
        }
        self.values.insert(name.to_string(), value);
        self.dirty.insert(name.to_string());
        self.assignments.push(name.to_string());
        Ok(())
    }

    fn denied(key: &str, role: &str) -> bool {
        role != STAFF_ROLE && (key == "tier" || key.starts_with("tier("))
    }
}

impl<K> std::fmt::Debug for Customer<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Customer")
            .field("values", &self.values)
            .finish()
    }
}

impl<K: Kind> RecordView for Customer<K> {
    fn read_attribute(&self, name: &str) -> Option<&AttrValue> {
        self.values.get(name)
    }
}

fn part_text(value: &AttrValue) -> String {
    match value {
        AttrValue::Int(i) => i.to_string(),
        AttrValue::Text(s) => s.clone(),
        other => format!("{other:?}"),
    }
}

impl<K: Kind> Record for Customer<K> {
    fn construct(input: Option<&InputMap>, options: &BuildOptions) -> Result<Self, BoxError> {
        let mut customer = Customer {
            values: HashMap::new(),
            dirty: HashSet::new(),
            assignments: Vec::new(),
            _kind: PhantomData,
        };
        let role = options.role_or("default");

        // Multi-parameter keys like `birthdate(1i)` are assembled per attribute.
        let mut parts: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        for (key, value) in input.into_iter().flatten() {
            if Self::denied(key, role) {
                continue;
            }
            match key.split_once('(') {
                Some((name, part)) => {
                    parts
                        .entry(name.to_string())
                        .or_default()
                        .insert(part.trim_end_matches(')').to_string(), part_text(value));
                }
                None => customer.assign(key, value.clone())?,
            }
        }
        for (name, pieces) in parts {
            let joined = pieces.into_values().collect::<Vec<_>>().join("-");
            customer.assign(&name, AttrValue::Text(joined))?;
        }
        Ok(customer)
    }

    fn write_attribute(&mut self, name: &str, value: AttrValue) -> Result<(), BoxError> {
        self.assign(name, value)
    }

    fn discard_pending_change(&mut self, name: &str) {
        self.dirty.remove(name);
    }

    fn is_key_denied(&self, key: &str, role: &str) -> Result<bool, BoxError> {
        Ok(Self::denied(key, role))
    }

    fn parent_type() -> Option<TypeKey> {
        K::parent()
    }
}

pub fn input(pairs: &[(&str, AttrValue)]) -> InputMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}
