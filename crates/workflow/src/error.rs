use std::error::Error as StdError;

/// Crate-wide result type for node operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed errors shared between the host and the nodes it runs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required node parameter has no value.
    #[error("missing node parameter: {name}")]
    MissingParameter { name: String },

    /// A node parameter is present but cannot be used.
    #[error("invalid node parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },

    /// No credentials of the requested type are stored.
    #[error("no credentials of type '{name}' configured")]
    MissingCredentials { name: String },

    /// An item does not carry the requested binary property.
    #[error("item {item_index} has no binary property '{property}'")]
    MissingBinaryData { item_index: usize, property: String },

    /// Processing a single input item failed.
    #[error("item {item_index}: {source}")]
    Node {
        item_index: usize,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// Wrapped source error from an external dependency.
    #[error("node operation failed: {context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// JSON (de)serialization failed.
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    /// Binary payload is not valid base64.
    #[error(transparent)]
    Base64(#[from] base64::DecodeError),
}

impl Error {
    #[must_use]
    pub fn missing_parameter(name: impl Into<String>) -> Self {
        Self::MissingParameter { name: name.into() }
    }

    #[must_use]
    pub fn invalid_parameter(name: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn missing_credentials(name: impl Into<String>) -> Self {
        Self::MissingCredentials { name: name.into() }
    }

    #[must_use]
    pub fn node(item_index: usize, source: impl StdError + Send + Sync + 'static) -> Self {
        Self::Node {
            item_index,
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}
