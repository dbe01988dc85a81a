//! Company ("empresa") management commands.

use tabled::Tabled;

use kyc_model::{EmpresaRequest, EmpresaResponse, EmpresaToken, PageResponse};

use crate::cli::EmpresaCommand;
use crate::config::OutputFormat;
use crate::output::{confirm, error, output_page, output_single, success, warning};
use crate::CliResult;

use super::user::validate_ruc;
use super::{query, Context};

/// Route guarding company management.
const ROUTE: &str = "/admin/empresas";

/// Company row for table output.
#[derive(Debug, Clone, Tabled)]
pub struct EmpresaRow {
    /// RUC.
    #[tabled(rename = "RUC")]
    pub ruc: String,
    /// Name.
    #[tabled(rename = "Name")]
    pub nombre: String,
    /// Contact e-mail.
    #[tabled(rename = "Email")]
    pub email: String,
    /// User in charge.
    #[tabled(rename = "In charge")]
    pub encargado: String,
}

impl From<&EmpresaResponse> for EmpresaRow {
    fn from(e: &EmpresaResponse) -> Self {
        Self {
            ruc: e.ruc.clone(),
            nombre: e.nombre.clone(),
            email: e.email.clone(),
            encargado: e
                .nombre_usuario_encargado
                .clone()
                .or_else(|| e.id_usuario_encargado.map(|id| format!("#{id}")))
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Runs a company command.
pub async fn run_empresa(cmd: EmpresaCommand, ctx: &Context) -> CliResult<()> {
    ctx.enter(ROUTE)?;

    match cmd {
        EmpresaCommand::List { filtro, page, size } => list(ctx, filtro, page, size).await,
        EmpresaCommand::Get { ruc } => {
            let empresa: EmpresaResponse = ctx.client.get(&path(&ruc)).await?;
            output_single(&empresa, ctx.format)
        }
        EmpresaCommand::Create {
            ruc,
            nombre,
            email,
            encargado,
        } => {
            validate_ruc(&ruc)?;
            let request = EmpresaRequest {
                ruc,
                nombre,
                email,
                id_usuario_encargado: encargado,
            };
            let created: EmpresaResponse = ctx.client.post("/empresas", &request).await?;
            success(&format!("Company '{}' ({}) created", created.nombre, created.ruc));
            Ok(())
        }
        EmpresaCommand::Update {
            ruc,
            nombre,
            email,
            encargado,
        } => update(ctx, &ruc, nombre, email, encargado).await,
        EmpresaCommand::Delete { ruc, force } => {
            if !force && !confirm(&format!("Are you sure you want to delete company {ruc}?"))? {
                error("Operation cancelled");
                return Ok(());
            }
            ctx.client.delete(&path(&ruc)).await?;
            success(&format!("Company {ruc} deleted"));
            Ok(())
        }
        EmpresaCommand::Token { ruc } => {
            let token: EmpresaToken = ctx.client.get(&format!("{}/token", path(&ruc))).await?;
            if ctx.format == OutputFormat::Json {
                println!("{}", serde_json::json!({ "ruc": ruc, "token": token.token }));
            } else {
                warning("Treat this token as a secret");
                println!("{}", token.token);
            }
            Ok(())
        }
    }
}

fn path(ruc: &str) -> String {
    format!("/empresas/{}", urlencoding::encode(ruc))
}

/// Lists one page of companies.
async fn list(ctx: &Context, filtro: Option<String>, page: u32, size: u32) -> CliResult<()> {
    let q = query(&[
        ("filtro", filtro),
        ("page", Some(page.to_string())),
        ("size", Some(size.to_string())),
    ]);
    let result: PageResponse<EmpresaResponse> = ctx.client.get(&format!("/empresas{q}")).await?;
    let rows: Vec<EmpresaRow> = result.content.iter().map(EmpresaRow::from).collect();
    output_page(&rows, &result, ctx.format)
}

/// Updates a company, keeping the fields that were not given.
async fn update(
    ctx: &Context,
    ruc: &str,
    nombre: Option<String>,
    email: Option<String>,
    encargado: Option<i64>,
) -> CliResult<()> {
    let current: EmpresaResponse = ctx.client.get(&path(ruc)).await?;
    let mut request = EmpresaRequest::from(&current);
    if let Some(n) = nombre {
        request.nombre = n;
    }
    if let Some(e) = email {
        request.email = e;
    }
    if encargado.is_some() {
        request.id_usuario_encargado = encargado;
    }

    let updated: EmpresaResponse = ctx.client.put(&path(ruc), &request).await?;
    success(&format!("Company '{}' updated", updated.nombre));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_shows_who_is_in_charge() {
        let mut empresa = EmpresaResponse {
            id: Some(1),
            ruc: "20100070970".to_string(),
            nombre: "Acme SAC".to_string(),
            email: "contacto@acme.pe".to_string(),
            id_usuario_encargado: Some(7),
            nombre_usuario_encargado: None,
        };
        assert_eq!(EmpresaRow::from(&empresa).encargado, "#7");

        empresa.nombre_usuario_encargado = Some("Ana".to_string());
        assert_eq!(EmpresaRow::from(&empresa).encargado, "Ana");
    }
}
