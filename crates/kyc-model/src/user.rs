//! Console user records (`/usuarios`).

use serde::{Deserialize, Serialize};

use crate::de::opt_string_or_number;
use crate::role::Role;

/// A console user as returned by `GET /usuarios`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsuarioListResponse {
    /// User ID.
    pub id: i64,
    /// Display name.
    pub nombre: String,
    /// Account e-mail.
    pub email: String,
    /// National identity document number.
    #[serde(default)]
    pub dni: Option<String>,
    /// RUC of the company the user belongs to.
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub empresa_ruc: Option<String>,
    /// Internal ID of the company.
    #[serde(default)]
    pub empresa_id: Option<i64>,
    /// Company name.
    #[serde(default)]
    pub empresa_nombre: Option<String>,
    /// Whether the account is active (inactive accounts are soft-deleted).
    pub activo: bool,
    /// Assigned role.
    pub rol: Role,
}

/// Body of `PUT /usuarios/{id}`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsuarioUpdateRequest {
    /// Display name.
    pub nombre: String,
    /// Account e-mail.
    pub email: String,
    /// RUC of the company to attach the user to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empresa_ruc: Option<String>,
    /// New password; omitted to keep the current one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Assigned role.
    pub rol: Role,
}

impl UsuarioUpdateRequest {
    /// Builds an update that keeps everything of `user` as-is.
    #[must_use]
    pub fn from_user(user: &UsuarioListResponse) -> Self {
        Self {
            nombre: user.nombre.clone(),
            email: user.email.clone(),
            empresa_ruc: user.empresa_ruc.clone(),
            password: None,
            rol: user.rol,
        }
    }
}

impl std::fmt::Debug for UsuarioUpdateRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsuarioUpdateRequest")
            .field("nombre", &self.nombre)
            .field("email", &self.email)
            .field("empresa_ruc", &self.empresa_ruc)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .field("rol", &self.rol)
            .finish()
    }
}
