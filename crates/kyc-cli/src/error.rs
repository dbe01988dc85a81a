//! CLI error types.

use kyc_session::{DenyReason, Redirect, SessionError};
use thiserror::Error;

/// CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Session or authentication failure.
    #[error("{}", .0.user_message())]
    Session(#[from] SessionError),

    /// API error on a console resource.
    #[error("{message} (HTTP {status})")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
    },

    /// The command's route refused entry.
    #[error("{}", describe_redirect(.0))]
    Redirected(Redirect),

    /// Validation error.
    #[error("validation error: {0}")]
    Validation(String),

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error.
    #[error("connection error: {0}")]
    Http(#[from] reqwest::Error),
}

fn describe_redirect(redirect: &Redirect) -> String {
    match redirect.reason {
        DenyReason::Unauthenticated => format!(
            "not logged in, run `kyc login` first (redirected to {})",
            redirect.url()
        ),
        DenyReason::Forbidden => format!(
            "your role does not allow this command (redirected to {})",
            redirect.url()
        ),
        DenyReason::NotFound => format!("unknown screen (redirected to {})", redirect.url()),
    }
}

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;
