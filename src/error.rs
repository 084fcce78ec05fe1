//! Error types for qbank-dl
//!
//! Two layers of errors exist:
//! - [`Error`] - run-level errors that abort a run before dispatch or fail a
//!   library/API operation (unreadable input list, unwritable output folder, ...)
//! - [`ItemError`] - per-item failures recorded in the run statistics. These never
//!   abort sibling work or the run as a whole.
//!
//! The module also provides the JSON error body used by the HTTP front-end and the
//! mapping from [`Error`] to HTTP status codes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for qbank-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for qbank-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "policy.max_in_flight")
        key: Option<String>,
    },

    /// The input list could not be read or parsed
    #[error("cannot load input list {path}: {reason}")]
    InputList {
        /// Path of the input list
        path: PathBuf,
        /// Why loading failed
        reason: String,
    },

    /// The output location could not be created or is not writable
    #[error("cannot prepare output folder {path}: {source}")]
    OutputLocation {
        /// Output folder that could not be prepared
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error (building the HTTP client, talking to the endpoint)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Question or folder not found
    #[error("not found: {0}")]
    NotFound(String),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a configuration error tied to a config key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

/// Per-item failure recorded by the coordinator
///
/// Every variant is isolated to one work item: it is logged, counted as a failure
/// in the run statistics, and never propagated further.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    /// A required field (`questionId` or `external_id`) was missing or invalid.
    /// No network call is made for such an item.
    #[error("malformed work item: {reason}")]
    Malformed {
        /// What was wrong with the record
        reason: String,
    },

    /// Connection failure, timeout, unexpected status or unparseable body
    #[error("{}", transport_message(*status, reason))]
    Transport {
        /// HTTP status, if a response was received
        status: Option<u16>,
        /// Diagnostic description
        reason: String,
    },

    /// The endpoint answered 429 Too Many Requests
    #[error("rate limited (429)")]
    RateLimited,

    /// The payload was fetched but could not be written
    #[error("failed to save record: {reason}")]
    Persistence {
        /// Underlying I/O description
        reason: String,
    },
}

fn transport_message(status: Option<u16>, reason: &str) -> String {
    match status {
        Some(code) => format!("request failed with status {code}: {reason}"),
        None => format!("request failed: {reason}"),
    }
}

impl ItemError {
    /// Whether the item ever reached the network
    pub fn was_dispatched(&self) -> bool {
        !matches!(self, ItemError::Malformed { .. })
    }
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "success": false,
///   "error": "Question with ID 'abc' not found in any folder",
///   "code": "not_found"
/// }
/// ```
///
/// The `success`/`error` pair is what the browser front-end checks; `code` is a
/// machine-readable addition.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Always `false`
    pub success: bool,
    /// Human-readable error message
    pub error: String,
    /// Machine-readable error code (e.g., "not_found")
    pub code: String,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
            code: code.into(),
        }
    }

    /// Create a "not found" error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", message)
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            Error::Config { .. } => 400,
            Error::InputList { .. } => 422,
            Error::NotFound(_) => 404,
            Error::Network(_) => 502,
            Error::OutputLocation { .. }
            | Error::Io(_)
            | Error::Serialization(_)
            | Error::ApiServerError(_)
            | Error::Other(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::InputList { .. } => "input_list_error",
            Error::OutputLocation { .. } => "output_location_error",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::NotFound(_) => "not_found",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        // NotFound carries a complete sentence for the front-end
        let message = match error {
            Error::NotFound(message) => message,
            other => other.to_string(),
        };
        ApiError::new(code, message)
    }
}
