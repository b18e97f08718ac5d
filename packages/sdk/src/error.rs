//! Error types for sandbox operations

use std::future::Future;

use thiserror::Error;

/// Result type for sandbox operations
pub type Result<T> = std::result::Result<T, Error>;

type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by the SDK.
///
/// Every public operation either returns a fully-ready result or fails with
/// one of these kinds; partial states are never returned as success.
#[derive(Debug, Error)]
pub enum Error {
    /// Caller input was rejected before any backend call was made.
    #[error("{0}")]
    Validation(String),

    /// No sandbox matched the requested id or label filter.
    #[error("{0}")]
    NotFound(String),

    /// A polling deadline elapsed before the sandbox reached the requested
    /// state. The message carries the last observed state.
    #[error("{0}")]
    Timeout(String),

    /// The backend reported a terminal failure state, or the API call
    /// itself failed.
    #[error("{message}")]
    Backend {
        message: String,
        #[source]
        source: Option<BoxedCause>,
    },
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not-found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a backend error without an underlying cause
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend {
            message: msg.into(),
            source: None,
        }
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Check if this is a not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }

    /// Prefix the message with an operation context, keeping the kind.
    ///
    /// `Timeout` and `Validation` pass through untouched; `NotFound` and
    /// `Backend` keep their kind and cause with the context prepended.
    fn contextualize(self, context: &str) -> Self {
        match self {
            Error::Validation(_) | Error::Timeout(_) => self,
            Error::NotFound(msg) => Error::NotFound(format!("{context}{msg}")),
            Error::Backend { message, source } => Error::Backend {
                message: format!("{context}{message}"),
                source,
            },
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Backend {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// Run a backend operation, prefixing any failure with `context`.
///
/// Error kinds survive interception: a `NotFound` stays `NotFound`, a
/// `Timeout` is never relabeled, and the original cause is retained.
pub(crate) async fn with_context<T, F>(context: &str, op: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    op.await.map_err(|err| err.contextualize(context))
}
