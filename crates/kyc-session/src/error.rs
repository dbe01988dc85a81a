//! Session error types.

use thiserror::Error;

/// Errors that can occur during session operations.
///
/// A missing, malformed or expired token is never an error: it simply means
/// there is no session. Only calls that reach the API or the durable store
/// fail.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The API answered with a non-success status.
    ///
    /// `message` is the server-provided message when the body carried one,
    /// otherwise a generic message for the operation.
    #[error("{message} (HTTP {status})")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message to show to the user.
        message: String,
    },

    /// The request never got a response (connection refused, timeout, ...).
    #[error("connection error: {0}")]
    Http(#[from] reqwest::Error),

    /// The login succeeded but the response carried no usable session token.
    #[error("login response did not contain a valid session token")]
    UnusableToken,

    /// Another login attempt is still waiting for its response.
    #[error("a login attempt is already in progress")]
    LoginInProgress,

    /// The durable session store could not be written.
    #[error("session storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// A record could not be serialized.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl SessionError {
    /// Message suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Checks if the API rejected the caller's credentials.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status: 401 | 403, .. })
    }
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
