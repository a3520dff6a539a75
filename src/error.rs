//! Error types for the `tick-relay` crate.
//!
//! All fallible operations in this crate return [`Result<T>`], which is an
//! alias for `std::result::Result<T, RelayError>`.
//!
//! [`RelayError`] covers:
//! - **API errors** — structured error responses from the broker's REST API
//! - **HTTP status errors** — unexpected status codes with response body
//! - **HTTP transport errors** — network, TLS, timeout failures
//! - **JSON errors** — deserialization failures
//! - **WebSocket errors** — connection and protocol errors
//! - **Scheduler errors** — connect-retry exhaustion, shutdown-in-progress
//! - **Catalog errors** — instrument catalog fetch/cache failures
//! - **Invalid arguments** — client-side validation errors

use std::fmt;

/// Error body returned by the broker's REST endpoints.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    /// Category of the error (e.g. "Invalid Authentication").
    #[serde(default)]
    pub error_type: Option<String>,
    /// Broker-specific error code.
    #[serde(default)]
    pub error_code: Option<String>,
    /// Human-readable description of the error.
    #[serde(default)]
    pub error_message: Option<String>,
}

impl fmt::Display for ApiErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.error_code.as_deref().unwrap_or("UNKNOWN"),
            self.error_type.as_deref().unwrap_or("Unknown Error"),
            self.error_message.as_deref().unwrap_or("No message"),
        )
    }
}

/// All possible errors produced by the `tick-relay` crate.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// A structured error response from the broker's REST API.
    #[error("API error: {0}")]
    Api(ApiErrorBody),

    /// The server returned an unexpected HTTP status code.
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// The HTTP status code.
        status: reqwest::StatusCode,
        /// The response body text.
        body: String,
    },

    /// A network or transport-level error from `reqwest`.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to deserialize a JSON response body.
    #[error("JSON deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A WebSocket-level error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// An error building or parsing a URL.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Credential acquisition or the broker's login handshake failed.
    ///
    /// Fatal on the initial connect: the process aborts rather than
    /// retrying.
    #[error("authentication failed: {0}")]
    AuthError(String),

    /// A transport-level failure while establishing an upstream connection.
    /// Retried up to `max_retries` by the Connection Supervisor.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The broker's streaming handshake completed but violated the expected
    /// protocol. Retried up to `max_retries`.
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// The Connection Supervisor exhausted `max_retries` attempting to
    /// (re)establish a connection.
    #[error("failed to connect connection {id} after {attempts} attempts")]
    ConnectFailed {
        /// The connection id that could not be (re)established.
        id: u8,
        /// Number of attempts made before giving up.
        attempts: u32,
    },

    /// A process-wide shutdown is in progress; the caller should stop.
    #[error("shutting down")]
    ShuttingDown,

    /// The instrument catalog could not be loaded and no cached copy exists.
    #[error("catalog unavailable: {0}")]
    Catalog(String),

    /// The caller provided an invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RelayError>;
