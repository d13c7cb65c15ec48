//! Client error types.

use thiserror::Error;

/// Client error type.
///
/// Ordinary HTTP error statuses are not errors: they come back as a
/// [`Response`](crate::Response) for the caller to inspect. These variants
/// cover what the transport cannot turn into a response.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP client could not be built or a request could not be assembled.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Local file I/O failed (uploads, downloads, export trees).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A redirect was received with no redirect budget left.
    #[error("Too many redirects (last location: {url})")]
    TooManyRedirects {
        /// URL that answered with the redirect.
        url: String,
    },

    /// 502/503/504 kept coming back until the retry budget ran out.
    #[error("Gateway error {status} after {attempts} attempt(s)")]
    GatewayRetriesExhausted {
        /// Last gateway status received.
        status: u16,
        /// Total attempts made.
        attempts: u32,
    },

    /// Server returned a non-success response and the caller asked for it
    /// to be treated as an error.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code (0 when no response was received).
        status: u16,
        /// Status message or transport error text.
        message: String,
    },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection file could not be read or resolved.
    #[error(transparent)]
    ConfigFile(#[from] kinetic_config::ConfigError),

    /// WebSocket subscription failed.
    #[error("WebSocket error: {0}")]
    WebSocket(String),
}

impl Error {
    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Api { status: 404, .. })
    }

    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Api { status: 401, .. })
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Api { status, .. } if *status >= 500)
            || matches!(self, Error::GatewayRetriesExhausted { .. })
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
