//! Error types for the ARAG assistant

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the ARAG assistant
///
/// Guard rejections are not errors: they travel as values inside
/// `GuardDecision` and `AgentResponse`. Everything here unwinds the
/// whole request.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Embedding service error: {0}")]
    Embedding(String),

    #[error("Vector index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Vector index not found: {0}")]
    IndexNotFound(String),

    #[error("LLM provider error: {0}")]
    LLMProvider(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl Error {
    /// True for failures of an external service call (embedding, vector
    /// database, language model, transport or deadline).
    pub fn is_service_error(&self) -> bool {
        matches!(
            self,
            Error::Embedding(_)
                | Error::IndexUnavailable(_)
                | Error::IndexNotFound(_)
                | Error::LLMProvider(_)
                | Error::Authentication(_)
                | Error::Network(_)
                | Error::Timeout(_)
        )
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Run `future` under a deadline, mapping expiry to [`Error::Timeout`].
pub async fn with_timeout<T, F>(limit: Duration, operation: &str, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(format!(
            "{} did not complete within {:?}",
            operation, limit
        ))),
    }
}
