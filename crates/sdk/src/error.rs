//! Error types for the Zoho CRM SDK.

/// Result type for SDK operations.
pub type ZohoResult<T> = Result<T, ZohoError>;

/// Coarse classification of a [`ZohoError`], for callers that branch on the
/// kind of failure rather than its details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid configuration; never retried.
    Configuration,
    /// Token refresh rejected, or the API kept answering 401.
    Authentication,
    /// The API answered with a failure status or an unreadable body.
    Api,
    /// The request did not complete.
    Network,
}

/// Error types that can occur when talking to Zoho CRM.
#[derive(Debug, thiserror::Error)]
pub enum ZohoError {
    /// HTTP request failed before a response was received.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success response.
    #[error("Zoho API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Invalid or incomplete configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Response body was not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ZohoError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Http(_) => ErrorKind::Network,
            Self::Api { .. } | Self::Json(_) => ErrorKind::Api,
            Self::Config(_) | Self::InvalidUrl(_) => ErrorKind::Configuration,
            Self::Authentication(_) => ErrorKind::Authentication,
        }
    }

    /// HTTP status carried by the error, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Create an API error from a status code and raw response body.
    ///
    /// JSON bodies are pretty-printed into the detail; anything else is kept
    /// verbatim.
    pub fn from_response(status: u16, body: &str) -> Self {
        Self::Api {
            status,
            body: response_detail(body),
        }
    }
}

/// Best-effort rendering of an error response body.
pub(crate) fn response_detail(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| body.to_string()),
        Err(_) => body.to_string(),
    }
}
