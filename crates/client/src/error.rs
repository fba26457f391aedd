//! Unified error taxonomy for the client library.
//!
//! Every fallible operation returns `Result<T, ApiError>`. The variants map
//! onto distinct user-visible behaviors: validation failures are corrected by
//! the user, cancellations are swallowed, auth failures redirect to login,
//! and everything else is surfaced as a transient notification.

use thiserror::Error;

/// Errors produced by the client data layer.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Mutation rejected locally before any network call.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A bulk fetch superseded by a newer one; never shown to the user.
    #[error("Request superseded by a newer one")]
    Cancelled,

    /// Missing or rejected bearer token (HTTP 401).
    #[error("Not authenticated")]
    Auth,

    /// Non-2xx response from the backend.
    #[error("Remote error (HTTP {status}): {message}")]
    Remote {
        /// HTTP status code.
        status: u16,
        /// Server-provided message, or a generic fallback.
        message: String,
    },

    /// Transport-level failure (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ApiError {
    /// Whether this error is a silently-ignored cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Message suitable for a user-facing notification.
    ///
    /// Uses the server-provided message when one exists; internal transport
    /// and parse details are replaced with a generic fallback.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) | Self::Remote { message: msg, .. } => msg.clone(),
            Self::Auth => "Please sign in to continue".to_string(),
            Self::Cancelled | Self::Http(_) | Self::Parse(_) => {
                "Something went wrong, please try again".to_string()
            }
        }
    }
}
