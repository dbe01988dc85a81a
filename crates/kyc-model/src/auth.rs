//! Authentication request and response records.

use serde::{Deserialize, Serialize};

use crate::role::Role;

/// Credentials sent to `POST /auth/login`.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Account e-mail.
    pub email: String,
    /// Plain-text password.
    pub password: String,
}

impl LoginRequest {
    /// Creates a login request.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"****")
            .finish()
    }
}

/// Response of the login and registration endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    /// User ID.
    pub id: i64,
    /// Account e-mail. Older backends send it as `acjMail`.
    #[serde(alias = "acjMail")]
    pub email: String,
    /// Signed session token; registration responses may omit it.
    #[serde(default)]
    pub token: Option<String>,
}

/// Profile sent to `POST /auth/register`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Display name.
    pub nombre: String,
    /// Account e-mail.
    pub email: String,
    /// National identity document number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dni: Option<String>,
    /// RUC of the company the account is assigned to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empresa_ruc: Option<String>,
    /// Plain-text password.
    pub password: String,
    /// Whether the account starts active.
    pub activo: bool,
    /// Role assigned to the new account.
    pub tipo_usuario: Role,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("nombre", &self.nombre)
            .field("email", &self.email)
            .field("dni", &self.dni)
            .field("empresa_ruc", &self.empresa_ruc)
            .field("activo", &self.activo)
            .field("tipo_usuario", &self.tipo_usuario)
            .finish_non_exhaustive()
    }
}

/// Body of `POST /auth/forgot-password`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
    /// Account e-mail that receives the reset link.
    pub email: String,
}

/// Body of `POST /auth/reset-password`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    /// Reset token from the e-mailed link.
    pub token: String,
    /// New password.
    pub new_password: String,
}

impl std::fmt::Debug for ResetPasswordRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResetPasswordRequest").finish_non_exhaustive()
    }
}
