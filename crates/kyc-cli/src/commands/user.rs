//! User management commands.

use tabled::Tabled;

use kyc_model::{Role, UsuarioListResponse, UsuarioUpdateRequest};

use crate::cli::UserCommand;
use crate::output::{confirm, error, output, output_single, prompt_new_password, success};
use crate::CliResult;

use super::Context;

/// Route guarding user management.
const ROUTE: &str = "/admin/users";

/// User row for table output.
#[derive(Debug, Clone, Tabled)]
pub struct UserRow {
    /// User ID.
    #[tabled(rename = "ID")]
    pub id: i64,
    /// Display name.
    #[tabled(rename = "Name")]
    pub nombre: String,
    /// E-mail.
    #[tabled(rename = "Email")]
    pub email: String,
    /// Role label.
    #[tabled(rename = "Role")]
    pub rol: &'static str,
    /// Company name or RUC.
    #[tabled(rename = "Company")]
    pub empresa: String,
    /// Active flag.
    #[tabled(rename = "Active")]
    pub activo: &'static str,
}

impl From<&UsuarioListResponse> for UserRow {
    fn from(u: &UsuarioListResponse) -> Self {
        Self {
            id: u.id,
            nombre: u.nombre.clone(),
            email: u.email.clone(),
            rol: u.rol.label(),
            empresa: u
                .empresa_nombre
                .clone()
                .or_else(|| u.empresa_ruc.clone())
                .unwrap_or_else(|| "-".to_string()),
            activo: if u.activo { "yes" } else { "no" },
        }
    }
}

/// Runs a user command.
pub async fn run_user(cmd: UserCommand, ctx: &Context) -> CliResult<()> {
    ctx.enter(ROUTE)?;

    match cmd {
        UserCommand::List => list_users(ctx).await,
        UserCommand::Get { id } => get_user(ctx, id).await,
        UserCommand::Update {
            id,
            nombre,
            email,
            empresa_ruc,
            role,
            password,
        } => update_user(ctx, id, nombre, email, empresa_ruc, role, password).await,
        UserCommand::ToggleActive { id } => toggle_active(ctx, id).await,
        UserCommand::Delete { id, force } => delete_user(ctx, id, force).await,
    }
}

/// Lists users.
async fn list_users(ctx: &Context) -> CliResult<()> {
    let users: Vec<UsuarioListResponse> = ctx.client.get("/usuarios").await?;
    let rows: Vec<UserRow> = users.iter().map(UserRow::from).collect();
    output(&rows, &users, ctx.format)
}

/// Gets a user by ID.
async fn get_user(ctx: &Context, id: i64) -> CliResult<()> {
    let user: UsuarioListResponse = ctx.client.get(&format!("/usuarios/{id}")).await?;
    output_single(&user, ctx.format)
}

/// Updates a user, keeping the fields that were not given.
#[allow(clippy::too_many_arguments)]
async fn update_user(
    ctx: &Context,
    id: i64,
    nombre: Option<String>,
    email: Option<String>,
    empresa_ruc: Option<String>,
    role: Option<Role>,
    password: bool,
) -> CliResult<()> {
    if role == Some(Role::SuperAdmin) && !ctx.session.is_super_admin() {
        return Err(crate::CliError::Validation(
            "only a SUPERADMIN can grant the SUPERADMIN role".to_string(),
        ));
    }

    let current: UsuarioListResponse = ctx.client.get(&format!("/usuarios/{id}")).await?;
    let mut request = UsuarioUpdateRequest::from_user(&current);
    if let Some(n) = nombre {
        request.nombre = n;
    }
    if let Some(e) = email {
        request.email = e;
    }
    if let Some(r) = empresa_ruc {
        validate_ruc(&r)?;
        request.empresa_ruc = Some(r);
    }
    if let Some(r) = role {
        request.rol = r;
    }
    if password {
        request.password = Some(prompt_new_password(MIN_ACCOUNT_PASSWORD)?);
    }

    let updated: UsuarioListResponse = ctx
        .client
        .put(&format!("/usuarios/{id}"), &request)
        .await?;
    success(&format!("User '{}' updated", updated.email));
    Ok(())
}

/// Flips the active flag of a user.
async fn toggle_active(ctx: &Context, id: i64) -> CliResult<()> {
    let user: UsuarioListResponse = ctx
        .client
        .patch(&format!("/usuarios/{id}/toggle-activo"))
        .await?;
    let state = if user.activo { "activated" } else { "deactivated" };
    success(&format!("User '{}' {state}", user.email));
    Ok(())
}

/// Deletes a user.
async fn delete_user(ctx: &Context, id: i64, force: bool) -> CliResult<()> {
    if !force && !confirm(&format!("Are you sure you want to delete user {id}?"))? {
        error("Operation cancelled");
        return Ok(());
    }

    ctx.client.delete(&format!("/usuarios/{id}")).await?;
    success(&format!("User {id} deleted"));
    Ok(())
}

/// Minimum length of a password set on an account.
pub(crate) const MIN_ACCOUNT_PASSWORD: usize = 6;

/// Checks that a RUC is 11 digits.
pub(crate) fn validate_ruc(ruc: &str) -> CliResult<()> {
    if ruc.len() == 11 && ruc.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(crate::CliError::Validation(format!(
            "RUC must be 11 digits: {ruc}"
        )))
    }
}
