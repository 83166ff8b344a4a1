//! Classifier client error types.

/// Errors from classifier calls.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// HTTP transport error, including timeouts.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        /// Which call failed.
        endpoint: String,
        /// Underlying transport error.
        source: reqwest::Error,
    },
    /// The service returned a non-2xx status.
    #[error("classifier {endpoint} returned {status}: {body}")]
    Api {
        /// Which call failed.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
    /// Response body did not match the expected shape.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        /// Which call failed.
        endpoint: String,
        /// Underlying decode error.
        source: reqwest::Error,
    },
    /// The capability is not configured.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}
