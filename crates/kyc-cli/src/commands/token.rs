//! Token inspection.

use kyc_session::token;

use crate::config::OutputFormat;
use crate::output::{error, info, success, warning};
use crate::{CliError, CliResult};

use super::Context;

/// Decodes a token (the stored session token when none is given) and
/// reports its expiry. The signature is not verified.
pub fn run_decode_token(raw: Option<String>, ctx: &Context) -> CliResult<()> {
    let raw = match raw.or_else(|| ctx.session.token()) {
        Some(t) => t,
        None => {
            return Err(CliError::InvalidArgument(
                "no token given and no stored session".to_string(),
            ))
        }
    };

    let (Some(header), Some(payload)) = (token::decode_header(&raw), token::decode_payload(&raw))
    else {
        return Err(CliError::InvalidArgument(
            "not a decodable token: expected header.payload.signature with JSON segments"
                .to_string(),
        ));
    };

    if ctx.format == OutputFormat::Json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "header": header,
                "payload": payload,
                "valid": token::is_valid(Some(&raw)),
            }))?
        );
        return Ok(());
    }

    println!("=== Header ===");
    println!("{}", serde_json::to_string_pretty(&header)?);
    println!("\n=== Payload ===");
    println!("{}", serde_json::to_string_pretty(&payload)?);
    println!();

    let claims = token::decode_claims(&raw);
    match claims.as_ref().and_then(|c| c.exp) {
        Some(exp) => {
            let at = describe(exp);
            if token::is_valid(Some(&raw)) {
                success(&format!("Token expires at: {at}"));
            } else {
                error(&format!("Token EXPIRED at: {at}"));
            }
        }
        None => warning("Token has no expiry claim and is treated as invalid"),
    }
    if let Some(iat) = claims.as_ref().and_then(|c| c.iat) {
        info(&format!("Token issued at: {}", describe(iat)));
    }
    if let Some(c) = &claims {
        if !c.roles.is_empty() {
            info(&format!("Roles: {}", c.roles.join(", ")));
        }
    }
    warning("Signature not verified; the API checks it on every request");
    Ok(())
}

fn describe(secs: i64) -> String {
    chrono::DateTime::from_timestamp(secs, 0).map_or_else(
        || "invalid timestamp".to_string(),
        |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}
