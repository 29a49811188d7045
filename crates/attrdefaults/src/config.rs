//! # Configuration
//!
//! Catalog configuration is managed by [`confique`], layered in priority
//! order:
//! 1. **Environment variables**: `ATTRDEFAULTS_DEFAULT_ROLE`, `ATTRDEFAULTS_KEY_MATCH`.
//! 2. **Config file**: a TOML file passed to [`DefaultsConfig::load`].
//! 3. **Compiled defaults**: via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `default_role` | `default` | Authorization role used when the caller names none |
//! | `key_match` | `multi_parameter` | How input keys suppress defaults (`exact` or `multi_parameter`) |

use std::path::Path;

use confique::Config;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::interceptor::KeyMatch;

/// Configuration for a [`DefaultsCatalog`](crate::catalog::DefaultsCatalog).
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DefaultsConfig {
    /// Role forwarded to the authorizer when build options carry none.
    #[config(default = "default", env = "ATTRDEFAULTS_DEFAULT_ROLE")]
    pub default_role: String,

    /// Input-key matching policy used to decide whether an attribute was supplied.
    #[config(default = "multi_parameter", env = "ATTRDEFAULTS_KEY_MATCH")]
    pub key_match: KeyMatch,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            default_role: "default".to_string(),
            key_match: KeyMatch::MultiParameter,
        }
    }
}

impl DefaultsConfig {
    /// Load from environment variables over compiled defaults.
    pub fn from_env() -> Result<Self> {
        Ok(Self::builder().env().load()?)
    }

    /// Load from a TOML file, with environment variables taking priority.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::builder().env().file(path.as_ref()).load()?)
    }
}
