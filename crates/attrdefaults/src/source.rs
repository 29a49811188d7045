//! How a default value is supplied.
//!
//! A [`ValueSource`] is either a literal held by the registry or a producer
//! function evaluated against the instance being built. The choice is made
//! once, at declaration time.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::BoxError;
use crate::value::{AttrValue, Duplicable};

/// Read-only view of a record under construction.
///
/// Producer functions receive this view so they can compute a default from
/// attributes that are already set, including earlier defaults.
pub trait RecordView {
    fn read_attribute(&self, name: &str) -> Option<&AttrValue>;
}

/// Function computing a default from the instance being built.
pub type Producer =
    Arc<dyn Fn(&dyn RecordView) -> Result<AttrValue, BoxError> + Send + Sync + 'static>;

#[derive(Clone)]
pub enum ValueSource {
    /// Fixed value, copied per instance when it is [`Duplicable`].
    Literal(AttrValue),

    /// Value computed per instance.
    Function(Producer),
}

impl ValueSource {
    pub fn literal(value: impl Into<AttrValue>) -> Self {
        ValueSource::Literal(value.into())
    }

    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&dyn RecordView) -> Result<AttrValue, BoxError> + Send + Sync + 'static,
    {
        ValueSource::Function(Arc::new(f))
    }

    pub fn is_function(&self) -> bool {
        matches!(self, ValueSource::Function(_))
    }

    /// Produce the default for `instance`.
    ///
    /// Literals come back as an independent copy when the value supports it
    /// and unchanged otherwise. Producer errors are returned untouched.
    pub fn produce(&self, instance: &dyn RecordView) -> Result<AttrValue, BoxError> {
        match self {
            ValueSource::Literal(value) => {
                Ok(value.duplicate().unwrap_or_else(|| value.clone()))
            }
            ValueSource::Function(f) => f(instance),
        }
    }
}

impl From<AttrValue> for ValueSource {
    fn from(value: AttrValue) -> Self {
        ValueSource::Literal(value)
    }
}

macro_rules! literal_source {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for ValueSource {
                fn from(value: $ty) -> Self {
                    ValueSource::Literal(value.into())
                }
            }
        )*
    };
}

literal_source!(&str, String, bool, i32, i64, f64, Uuid, DateTime<Utc>);

impl<T: Into<AttrValue>> From<Vec<T>> for ValueSource {
    fn from(values: Vec<T>) -> Self {
        ValueSource::Literal(values.into())
    }
}

/// Closures become producers, so batch declarations need no wrapping.
impl<F> From<F> for ValueSource
where
    F: Fn(&dyn RecordView) -> Result<AttrValue, BoxError> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        ValueSource::function(f)
    }
}

impl fmt::Debug for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            ValueSource::Function(_) => f.write_str("Function(..)"),
        }
    }
}
