use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("bale api {method} failed ({code}): {description}")]
    Api {
        method: String,
        code: i64,
        description: String,
    },

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Workflow(#[from] baleflow_workflow::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),

    #[error("unknown reply markup mode: {0}")]
    UnknownMarkupMode(String),

    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    #[error("{message}")]
    Message { message: String },

    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn api(method: impl Into<String>, code: i64, description: impl Into<String>) -> Self {
        Self::Api {
            method: method.into(),
            code,
            description: description.into(),
        }
    }
}

impl From<Error> for baleflow_workflow::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::Workflow(inner) => inner,
            Error::UnknownMarkupMode(mode) => Self::invalid_parameter(
                crate::markup::REPLY_MARKUP,
                format!("unknown mode '{mode}'"),
            ),
            Error::UnknownOperation(operation) => Self::invalid_parameter(
                crate::operation::params::OPERATION,
                format!("unknown operation '{operation}'"),
            ),
            other => Self::external("bale", other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
