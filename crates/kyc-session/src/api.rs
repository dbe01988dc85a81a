//! Authentication endpoints.
//!
//! [`AuthApi`] is the seam between the session and the backend: the
//! production implementation talks HTTP, tests plug in an in-memory one.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use kyc_model::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
};

use crate::error::{SessionError, SessionResult};

/// Fallback message for a failed login.
pub const LOGIN_FAILED: &str = "Invalid credentials";
/// Fallback message for a failed registration.
pub const REGISTER_FAILED: &str = "Could not register the user";
/// Fallback message for a failed forgot-password request.
pub const FORGOT_PASSWORD_FAILED: &str = "Could not process the password reset request";
/// Fallback message for a failed password reset.
pub const RESET_PASSWORD_FAILED: &str = "Could not reset the password";
/// Fallback message for a rejected reset token.
pub const RESET_TOKEN_INVALID: &str = "The reset token is invalid or has expired";

/// Backend authentication operations.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchanges credentials for a session token.
    async fn login(&self, credentials: &LoginRequest) -> SessionResult<AuthResponse>;

    /// Creates a new account.
    async fn register(&self, request: &RegisterRequest) -> SessionResult<AuthResponse>;

    /// Sends a password reset link to the given e-mail.
    async fn forgot_password(&self, request: &ForgotPasswordRequest) -> SessionResult<()>;

    /// Sets a new password using a reset token.
    async fn reset_password(&self, request: &ResetPasswordRequest) -> SessionResult<()>;

    /// Checks that a reset token is still usable.
    async fn validate_reset_token(&self, token: &str) -> SessionResult<()>;
}

/// Extracts the user-facing message from an error response body.
///
/// Looks at `message`, then `error`, then `detail`; plain-text bodies are
/// used verbatim when short.
#[must_use]
pub fn server_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        return ["message", "error", "detail"]
            .iter()
            .filter_map(|k| value.get(*k).and_then(|v| v.as_str()))
            .map(str::trim)
            .find(|m| !m.is_empty())
            .map(String::from);
    }
    if body.len() <= 200 && !body.starts_with('<') {
        return Some(body.to_string());
    }
    None
}

/// Converts a non-success response into [`SessionError::Api`].
pub async fn api_error(response: reqwest::Response, fallback: &str) -> SessionError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    SessionError::Api {
        status,
        message: server_message(&body).unwrap_or_else(|| fallback.to_string()),
    }
}

/// HTTP implementation of [`AuthApi`].
#[derive(Debug, Clone)]
pub struct HttpAuthApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAuthApi {
    /// Creates a client for the API at `base_url` (e.g.
    /// `http://localhost:8080/api`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> SessionResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Creates a client reusing an existing `reqwest::Client`.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth{}", self.base_url, path)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B, fallback: &str) -> SessionResult<T>
    where
        B: serde::Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(api_error(response, fallback).await)
        }
    }

    async fn post_empty<B>(&self, path: &str, body: &B, fallback: &str) -> SessionResult<()>
    where
        B: serde::Serialize + Sync,
    {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(api_error(response, fallback).await)
        }
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, credentials: &LoginRequest) -> SessionResult<AuthResponse> {
        self.post_json("/login", credentials, LOGIN_FAILED).await
    }

    async fn register(&self, request: &RegisterRequest) -> SessionResult<AuthResponse> {
        self.post_json("/register", request, REGISTER_FAILED).await
    }

    async fn forgot_password(&self, request: &ForgotPasswordRequest) -> SessionResult<()> {
        self.post_empty("/forgot-password", request, FORGOT_PASSWORD_FAILED)
            .await
    }

    async fn reset_password(&self, request: &ResetPasswordRequest) -> SessionResult<()> {
        self.post_empty("/reset-password", request, RESET_PASSWORD_FAILED)
            .await
    }

    async fn validate_reset_token(&self, token: &str) -> SessionResult<()> {
        let response = self
            .client
            .get(self.url("/validate-reset-token"))
            .query(&[("token", token)])
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(api_error(response, RESET_TOKEN_INVALID).await)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_field_wins() {
        let body = r#"{"error": "Unauthorized", "message": "Usuario inactivo"}"#;
        assert_eq!(server_message(body).as_deref(), Some("Usuario inactivo"));
    }

    #[test]
    fn falls_back_to_error_field() {
        let body = r#"{"error": "Bad Request", "message": ""}"#;
        assert_eq!(server_message(body).as_deref(), Some("Bad Request"));
    }

    #[test]
    fn json_without_message_is_none() {
        assert!(server_message(r#"{"status": 500}"#).is_none());
        assert!(server_message("").is_none());
    }

    #[test]
    fn short_text_is_used_html_is_not() {
        assert_eq!(server_message("Forbidden").as_deref(), Some("Forbidden"));
        assert!(server_message("<html><body>502</body></html>").is_none());
    }

    #[test]
    fn urls_are_rooted_at_auth() {
        let api = HttpAuthApi::with_client(reqwest::Client::new(), "http://localhost:8080/api/");
        assert_eq!(api.url("/login"), "http://localhost:8080/api/auth/login");
    }
}
