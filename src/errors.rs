/*!
 * Error types for the transcript translator.
 *
 * Provider failures are all treated as transient by the translation gateway,
 * which retries and then degrades the chunk instead of propagating them.
 * Only a failure to open a translator session fails a whole document.
 */

use thiserror::Error;

/// Errors that can occur when calling a translation service
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The service throttled the caller
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// The provider could not be configured (bad endpoint, missing key)
    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    /// Map a reqwest failure onto the provider taxonomy
    pub fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }

    /// Build the error for a non-success HTTP status
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status_code == 429 {
            Self::RateLimitExceeded(message)
        } else {
            Self::ApiError { status_code, message }
        }
    }
}

/// Document-level failures raised by the pipeline
#[derive(Error, Debug)]
pub enum TranslationError {
    /// No translator session could be opened for the document
    #[error("Failed to open translator session for {document}: {source}")]
    Session {
        document: String,
        #[source]
        source: ProviderError,
    },
}
