//! # attrdefaults
//!
//! Declarative attribute defaults for persistent-record types. A record type
//! declares once which attributes receive a default, and every new instance
//! built through the catalog gets those defaults for the attributes the
//! caller did not effectively supply.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Declaration (catalog.rs)                                   │
//! │  - default_value_for / default_values on record types       │
//! │  - one registry per type, inherited, copy-on-write          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Construction (interceptor.rs)                              │
//! │  - base constructor → allowed keys → defaults → hook        │
//! │  - defaults bypass change tracking                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Record collaborators (record.rs)                           │
//! │  - construct, write_attribute, discard_pending_change       │
//! │  - is_key_denied (mass-assignment authorization)            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## What counts as supplied
//!
//! An attribute is supplied when an input key that the authorizer did not
//! deny names it. Under the default [`KeyMatch::MultiParameter`] policy a
//! multi-parameter key such as `birthdate(1i)` also supplies `birthdate`.
//! Denied keys are treated as absent, so their attributes are defaulted.
//!
//! ## Literal vs. computed defaults
//!
//! Literal defaults are copied per instance when the value is
//! [`Duplicable`], so two records never share a defaulted list or map.
//! Producer functions receive a [`RecordView`] of the instance and run in
//! declaration order, which lets later defaults read earlier ones.
//!
//! ## Usage
//!
//! ```ignore
//! use attrdefaults::{AttrValue, BuildOptions, DefaultValueFor};
//!
//! Article::default_value_for("state", "draft");
//! Article::default_value_for("tags", AttrValue::from(vec!["inbox"]));
//! Article::default_value_for_with("slug", |rec| {
//!     let title = rec.read_attribute("title").and_then(AttrValue::as_text);
//!     Ok(AttrValue::from(title.unwrap_or("untitled").to_lowercase()))
//! });
//!
//! let article = Article::build_defaulted(None, &BuildOptions::default())?;
//! ```
//!
//! ## Module Overview
//!
//! - [`catalog`]: per-type registries, installation, building
//! - [`interceptor`]: the construction-time application algorithm
//! - [`registry`]: ordered default declarations
//! - [`source`]: literal and function value sources
//! - [`record`]: collaborator traits implemented by the record type
//! - [`value`]: attribute values and the duplication capability
//! - [`config`]: configuration loading
//! - [`error`]: error types

pub mod catalog;
pub mod config;
pub mod error;
pub mod interceptor;
pub mod record;
pub mod registry;
pub mod source;
pub mod value;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use catalog::{DefaultValueFor, DefaultsCatalog};
pub use config::DefaultsConfig;
pub use error::{BoxError, DefaultsError, Result};
pub use interceptor::{ConstructionInterceptor, KeyMatch};
pub use record::{BuildOptions, Record, TypeKey};
pub use registry::DefaultRegistry;
pub use source::{Producer, RecordView, ValueSource};
pub use value::{input_from_json, AttrValue, Duplicable, InputMap, SharedValue};
