//! Attribute value types and the duplication capability.
//!
//! This module defines the runtime representation of attribute values,
//! the caller-supplied input mapping, and the [`Duplicable`] trait that
//! decides whether a literal default is copied per instance or handed out
//! as-is.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::{DefaultsError, Result};

/// Caller-supplied input for a construction, keyed by attribute name.
///
/// Iteration order is insertion order, which is also the order keys are
/// presented to the authorizer.
pub type InputMap = IndexMap<String, AttrValue>;

/// Runtime representation of an attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),

    /// Ordered sequence (e.g. `tags`)
    List(Vec<AttrValue>),

    /// Structured record / nested mapping (e.g. `settings`)
    Map(IndexMap<String, AttrValue>),

    /// Handle to a value that must never be duplicated.
    ///
    /// Every clone points at the same underlying object.
    Shared(SharedValue),
}

/// Shared, interior-mutable handle to an [`AttrValue`].
///
/// Equality is identity: two handles are equal only when they point at the
/// same object.
#[derive(Debug, Clone)]
pub struct SharedValue(Arc<RwLock<AttrValue>>);

impl SharedValue {
    pub fn new(value: AttrValue) -> Self {
        Self(Arc::new(RwLock::new(value)))
    }

    /// Snapshot of the current inner value.
    pub fn get(&self) -> AttrValue {
        self.0.read().clone()
    }

    pub fn set(&self, value: AttrValue) {
        *self.0.write() = value;
    }

    pub fn ptr_eq(&self, other: &SharedValue) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for SharedValue {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl AttrValue {
    /// Wrap a value in a non-duplicable shared handle.
    pub fn shared(value: AttrValue) -> Self {
        AttrValue::Shared(SharedValue::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AttrValue]> {
        match self {
            AttrValue::List(v) => Some(v),
            _ => None,
        }
    }

    /// Mutable access to a list, for callers editing a defaulted collection.
    pub fn as_list_mut(&mut self) -> Option<&mut Vec<AttrValue>> {
        match self {
            AttrValue::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, AttrValue>> {
        match self {
            AttrValue::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_shared(&self) -> Option<&SharedValue> {
        match self {
            AttrValue::Shared(s) => Some(s),
            _ => None,
        }
    }
}

/// Capability to produce an independent copy of a value.
///
/// `None` means the value is handed out as-is: either it is atomic (copying
/// is meaningless) or it is explicitly marked as non-duplicable.
pub trait Duplicable: Sized {
    fn duplicate(&self) -> Option<Self>;
}

impl Duplicable for AttrValue {
    fn duplicate(&self) -> Option<Self> {
        match self {
            AttrValue::Text(_) | AttrValue::List(_) | AttrValue::Map(_) => Some(self.clone()),
            AttrValue::Null
            | AttrValue::Bool(_)
            | AttrValue::Int(_)
            | AttrValue::Float(_)
            | AttrValue::Timestamp(_)
            | AttrValue::Uuid(_)
            | AttrValue::Shared(_) => None,
        }
    }
}

impl Duplicable for String {
    fn duplicate(&self) -> Option<Self> {
        Some(self.clone())
    }
}

impl<T: Clone> Duplicable for Vec<T> {
    fn duplicate(&self) -> Option<Self> {
        Some(self.clone())
    }
}

macro_rules! atomic_duplicable {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Duplicable for $ty {
                fn duplicate(&self) -> Option<Self> {
                    None
                }
            }
        )*
    };
}

atomic_duplicable!(bool, i32, i64, u32, u64, f64, char, Uuid, DateTime<Utc>);

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        AttrValue::Int(v.into())
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Text(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Text(v)
    }
}

impl From<DateTime<Utc>> for AttrValue {
    fn from(v: DateTime<Utc>) -> Self {
        AttrValue::Timestamp(v)
    }
}

impl From<Uuid> for AttrValue {
    fn from(v: Uuid) -> Self {
        AttrValue::Uuid(v)
    }
}

impl<T: Into<AttrValue>> From<Vec<T>> for AttrValue {
    fn from(v: Vec<T>) -> Self {
        AttrValue::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for AttrValue {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value;
        match v {
            Value::Null => AttrValue::Null,
            Value::Bool(b) => AttrValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => AttrValue::Int(i),
                None => AttrValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => AttrValue::Text(s),
            Value::Array(items) => AttrValue::List(items.into_iter().map(Into::into).collect()),
            Value::Object(fields) => AttrValue::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, AttrValue::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Build an [`InputMap`] from a JSON request body.
///
/// Only a top-level object is accepted; its keys become the input keys.
pub fn input_from_json(body: serde_json::Value) -> Result<InputMap> {
    match body {
        serde_json::Value::Object(fields) => Ok(fields
            .into_iter()
            .map(|(k, v)| (k, AttrValue::from(v)))
            .collect()),
        other => Err(DefaultsError::InvalidInput(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
