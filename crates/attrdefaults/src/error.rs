use thiserror::Error;

/// Boxed error returned by the record collaborators and producer functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum DefaultsError {
    #[error("Construction failed: {0}")]
    Construction(#[source] BoxError),

    #[error("Default producer for `{attribute}` failed: {source}")]
    Producer {
        attribute: String,
        #[source]
        source: BoxError,
    },

    #[error("Cannot assign default to `{attribute}`: {source}")]
    Assignment {
        attribute: String,
        #[source]
        source: BoxError,
    },

    #[error("Authorizer failed on key `{key}`: {source}")]
    Authorization {
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Config error: {0}")]
    Config(#[from] confique::Error),
}

impl DefaultsError {
    /// The attribute a default was being applied to when this error occurred.
    pub fn attribute(&self) -> Option<&str> {
        match self {
            DefaultsError::Producer { attribute, .. }
            | DefaultsError::Assignment { attribute, .. } => Some(attribute),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DefaultsError>;
