//! Session commands: login, logout, whoami, registration and password reset.

use colored::Colorize;
use serde::Serialize;

use kyc_model::{ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest, Role};

use crate::config::OutputFormat;
use crate::output::{info, output_single, prompt, prompt_new_password, prompt_password, success};
use crate::{CliError, CliResult};

use super::user::{validate_ruc, MIN_ACCOUNT_PASSWORD};
use super::Context;

/// Minimum length of a password chosen through a reset link.
const MIN_RESET_PASSWORD: usize = 8;

/// Logs in, prompting for whatever was not given.
pub async fn login(
    ctx: &Context,
    email: Option<String>,
    password: Option<String>,
) -> CliResult<()> {
    ctx.enter("/login")?;

    let email = match email {
        Some(e) => e,
        None => prompt("E-mail: ")?,
    };
    let password = match password {
        Some(p) => p,
        None => prompt_password("Password: ")?,
    };

    let user = ctx.session.login(&LoginRequest::new(email, password)).await?;
    success(&format!("Logged in as {}", user.label().bold()));
    let roles = ctx.session.roles();
    if !roles.is_empty() {
        info(&format!("Roles: {}", roles.join(", ")));
    }
    Ok(())
}

/// Ends the session. Never fails.
pub fn logout(ctx: &Context) -> CliResult<()> {
    let was_logged_in = ctx.session.current_user().is_some();
    ctx.session.logout();
    if was_logged_in {
        success("Logged out");
    } else {
        info("No session to close");
    }
    Ok(())
}

/// What `whoami` reports.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionInfo {
    authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nombre: Option<String>,
    roles: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    empresa_ruc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<String>,
}

/// Shows the current session.
pub fn whoami(ctx: &Context) -> CliResult<()> {
    let snapshot = ctx.session.snapshot();
    let authenticated = ctx.session.is_authenticated();
    let info_record = SessionInfo {
        authenticated,
        id: snapshot.user.as_ref().map(|u| u.id),
        email: snapshot.user.as_ref().map(|u| u.email.clone()),
        nombre: ctx.session.display_name(),
        roles: snapshot.roles.clone(),
        empresa_ruc: ctx.session.company_id(),
        expires_at: snapshot.expires_at.and_then(format_timestamp),
    };

    if ctx.format != OutputFormat::Table {
        return output_single(&info_record, ctx.format);
    }

    match (&snapshot.user, authenticated) {
        (Some(user), true) => {
            success(&format!("Logged in as {}", user.label().bold()));
            println!("  id:      {}", user.id);
            println!("  email:   {}", user.email);
            if !info_record.roles.is_empty() {
                println!("  roles:   {}", info_record.roles.join(", "));
            }
            if let Some(ruc) = &info_record.empresa_ruc {
                println!("  empresa: {ruc}");
            }
            if let Some(exp) = &info_record.expires_at {
                println!("  expires: {exp}");
            }
        }
        (None, true) => success("Logged in"),
        (Some(user), false) => info(&format!(
            "Not logged in (last session: {}, expired)",
            user.label()
        )),
        (None, false) => info("Not logged in"),
    }
    Ok(())
}

/// Checks that a DNI is 8 digits.
fn validate_dni(dni: &str) -> CliResult<()> {
    if dni.len() == 8 && dni.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(CliError::Validation(format!("DNI must be 8 digits: {dni}")))
    }
}

fn format_timestamp(secs: i64) -> Option<String> {
    chrono::DateTime::from_timestamp(secs, 0).map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}

/// Registers a new account.
pub async fn register(
    ctx: &Context,
    nombre: String,
    email: String,
    dni: Option<String>,
    empresa_ruc: Option<String>,
    role: Role,
    inactive: bool,
) -> CliResult<()> {
    ctx.enter("/register")?;
    if let Some(dni) = &dni {
        validate_dni(dni)?;
    }
    if let Some(ruc) = &empresa_ruc {
        validate_ruc(ruc)?;
    }
    let password = prompt_new_password(MIN_ACCOUNT_PASSWORD)?;

    let response = ctx
        .session
        .register(&RegisterRequest {
            nombre,
            email,
            dni,
            empresa_ruc,
            password,
            activo: !inactive,
            tipo_usuario: role,
        })
        .await?;
    success(&format!(
        "Account '{}' registered (id {})",
        response.email, response.id
    ));
    Ok(())
}

/// Requests a password reset e-mail.
pub async fn forgot_password(ctx: &Context, email: String) -> CliResult<()> {
    ctx.enter("/forgot-password")?;
    ctx.session
        .forgot_password(&ForgotPasswordRequest {
            email: email.clone(),
        })
        .await?;
    success(&format!("If '{email}' has an account, a reset link is on its way"));
    Ok(())
}

/// Sets a new password with a reset token.
pub async fn reset_password(ctx: &Context, token: String) -> CliResult<()> {
    ctx.enter("/reset-password")?;
    ctx.session.validate_reset_token(&token).await?;

    let new_password = prompt_new_password(MIN_RESET_PASSWORD)?;
    ctx.session
        .reset_password(&ResetPasswordRequest {
            token,
            new_password,
        })
        .await?;
    success("Password updated, you can log in now");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::output::check_new_password;

    #[test]
    fn dni_must_be_eight_digits() {
        assert!(validate_dni("45678912").is_ok());
        assert!(validate_dni("4567891").is_err());
        assert!(validate_dni("456789123").is_err());
        assert!(validate_dni("4567891a").is_err());
    }

    #[test]
    fn password_length_depends_on_the_flow() {
        assert!(check_new_password("abc123", "abc123", MIN_ACCOUNT_PASSWORD).is_ok());
        assert!(check_new_password("abc12", "abc12", MIN_ACCOUNT_PASSWORD).is_err());
        assert!(check_new_password("abc123", "abc123", MIN_RESET_PASSWORD).is_err());
        assert!(check_new_password("abcd1234", "abcd1234", MIN_RESET_PASSWORD).is_ok());
        assert!(check_new_password("ñandú1", "ñandú1", MIN_ACCOUNT_PASSWORD).is_ok());

        let err = check_new_password("abcd1234", "abcd1235", MIN_RESET_PASSWORD).unwrap_err();
        assert!(err.to_string().contains("do not match"));
    }

    #[test]
    fn timestamps_render_in_utc() {
        assert_eq!(
            format_timestamp(0).as_deref(),
            Some("1970-01-01 00:00:00 UTC")
        );
    }
}
