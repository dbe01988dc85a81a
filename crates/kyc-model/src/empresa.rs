//! Company records (`/empresas`).

use serde::{Deserialize, Serialize};

/// A company as returned by `GET /empresas`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmpresaResponse {
    /// Internal ID.
    #[serde(default)]
    pub id: Option<i64>,
    /// Tax identifier; also the resource key in URLs.
    pub ruc: String,
    /// Company name.
    pub nombre: String,
    /// Contact e-mail.
    pub email: String,
    /// ID of the user in charge of the company.
    #[serde(default)]
    pub id_usuario_encargado: Option<i64>,
    /// Name of the user in charge of the company.
    #[serde(default)]
    pub nombre_usuario_encargado: Option<String>,
}

/// Body of `POST /empresas` and `PUT /empresas/{ruc}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmpresaRequest {
    /// Tax identifier.
    pub ruc: String,
    /// Company name.
    pub nombre: String,
    /// Contact e-mail.
    pub email: String,
    /// ID of the user in charge of the company.
    pub id_usuario_encargado: Option<i64>,
}

impl From<&EmpresaResponse> for EmpresaRequest {
    fn from(e: &EmpresaResponse) -> Self {
        Self {
            ruc: e.ruc.clone(),
            nombre: e.nombre.clone(),
            email: e.email.clone(),
            id_usuario_encargado: e.id_usuario_encargado,
        }
    }
}

/// Integration token issued to a company (`GET /empresas/{ruc}/token`).
#[derive(Clone, Serialize, Deserialize)]
pub struct EmpresaToken {
    /// The token value.
    pub token: String,
}

impl std::fmt::Debug for EmpresaToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmpresaToken").finish_non_exhaustive()
    }
}
