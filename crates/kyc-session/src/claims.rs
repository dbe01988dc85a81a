//! Session token claims and the cached current-user record.
//!
//! Only `exp`, `roles`, the company id and the display name are consumed.
//! Each is read on its own from the decoded payload, so an unexpected type
//! in any other claim never makes a token unreadable.
//!
//! Claim names changed across backend releases. The canonical names are
//! `empresaRuc` for the company and `nombre` for the display name; tokens
//! still carrying the older `ruc` / `name` claims are migrated at decode
//! time.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use kyc_model::Role;

/// Legacy claim carrying the company RUC.
const LEGACY_COMPANY_CLAIM: &str = "ruc";

/// Legacy claim carrying the display name.
const LEGACY_NAME_CLAIM: &str = "name";

/// Claims read from the session token payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    /// Expiration time (Unix timestamp, seconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Issued at time (Unix timestamp, seconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Role names granted to the session.
    pub roles: Vec<String>,

    /// RUC of the company the account belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empresa_ruc: Option<String>,

    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,

    /// Claims this client does not interpret, as sent.
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

impl TokenClaims {
    /// Reads the consumed claims out of a decoded payload. A consumed claim
    /// with an unusable type reads as missing; everything else is kept
    /// untouched in [`TokenClaims::additional`].
    #[must_use]
    pub fn from_payload(mut payload: Map<String, Value>) -> Self {
        let exp = payload.remove("exp");
        let iat = payload.remove("iat");
        let roles = payload.remove("roles");
        let empresa_ruc = payload.remove("empresaRuc");
        let nombre = payload.remove("nombre");
        let legacy_ruc = payload.remove(LEGACY_COMPANY_CLAIM);
        let legacy_name = payload.remove(LEGACY_NAME_CLAIM);

        Self {
            exp: exp.as_ref().and_then(timestamp),
            iat: iat.as_ref().and_then(timestamp),
            roles: roles.as_ref().map(role_names).unwrap_or_default(),
            empresa_ruc: empresa_ruc
                .as_ref()
                .and_then(ruc)
                .or_else(|| legacy_ruc.as_ref().and_then(ruc)),
            nombre: nombre
                .as_ref()
                .and_then(text)
                .or_else(|| legacy_name.as_ref().and_then(text)),
            additional: payload,
        }
    }

    /// Checks if the token is expired at `now` (Unix seconds).
    ///
    /// A token is only valid strictly before its expiry; a token without an
    /// `exp` claim is treated as expired.
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp.map_or(true, |exp| now >= exp)
    }

    /// Checks if the token is expired now.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(chrono::Utc::now().timestamp())
    }

    /// Roles that map to a known [`Role`].
    #[must_use]
    pub fn known_roles(&self) -> Vec<Role> {
        self.roles.iter().filter_map(|r| r.parse().ok()).collect()
    }
}

/// Integer or fractional seconds.
#[allow(clippy::cast_possible_truncation)]
fn timestamp(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.floor() as i64)),
        _ => None,
    }
}

/// A single role name or a list of them; non-string entries are skipped.
fn role_names(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect(),
        _ => Vec::new(),
    }
}

/// RUCs arrive as strings or, from older backends, as numbers.
fn ruc(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        other => text(other),
    }
}

/// Non-blank string.
fn text(value: &Value) -> Option<String> {
    value
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .map(String::from)
}

/// Minimal record of the logged-in user, cached next to the token so the
/// console can show who is logged in before the token is decoded again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    /// User ID.
    pub id: i64,

    /// Account e-mail. Records cached by older releases use `acjMail`.
    #[serde(alias = "acjMail")]
    pub email: String,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,

    /// Role names at login time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,

    /// RUC of the user's company.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empresa_ruc: Option<String>,
}

impl CurrentUser {
    /// Creates a user record with only the mandatory fields.
    #[must_use]
    pub fn new(id: i64, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            nombre: None,
            roles: None,
            empresa_ruc: None,
        }
    }

    /// Name to greet the user with: display name, else e-mail.
    #[must_use]
    pub fn label(&self) -> &str {
        self.nombre.as_deref().unwrap_or(&self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(payload: Value) -> TokenClaims {
        match payload {
            Value::Object(map) => TokenClaims::from_payload(map),
            _ => panic!("payload must be an object"),
        }
    }

    #[test]
    fn legacy_claims_are_migrated() {
        let claims = claims(serde_json::json!({
            "exp": 100,
            "roles": ["ADMIN"],
            "ruc": 20100070970_i64,
            "name": "Ana"
        }));
        assert_eq!(claims.empresa_ruc.as_deref(), Some("20100070970"));
        assert_eq!(claims.nombre.as_deref(), Some("Ana"));
        assert!(claims.additional.is_empty());
    }

    #[test]
    fn canonical_claims_win_over_legacy() {
        let claims = claims(serde_json::json!({
            "empresaRuc": "20555555551",
            "ruc": "20999999999",
            "nombre": "Ana Torres",
            "name": "ana"
        }));
        assert_eq!(claims.empresa_ruc.as_deref(), Some("20555555551"));
        assert_eq!(claims.nombre.as_deref(), Some("Ana Torres"));
    }

    #[test]
    fn unexpected_types_in_other_claims_are_kept_as_sent() {
        let claims = claims(serde_json::json!({
            "sub": 42,
            "email": {"primary": "a@b.pe"},
            "iat": "yesterday",
            "exp": 2_000,
            "roles": ["ADMIN", 7]
        }));
        assert_eq!(claims.exp, Some(2_000));
        assert_eq!(claims.iat, None);
        assert_eq!(claims.roles, vec!["ADMIN"]);
        assert_eq!(claims.additional["sub"], 42);
        assert!(!claims.is_expired_at(1_000));
    }

    #[test]
    fn expiry_boundary_counts_as_expired() {
        let claims = TokenClaims {
            exp: Some(1_000),
            ..TokenClaims::default()
        };
        assert!(!claims.is_expired_at(999));
        assert!(claims.is_expired_at(1_000));
        assert!(claims.is_expired_at(1_001));
        assert!(TokenClaims::default().is_expired_at(0));
    }

    #[test]
    fn single_role_and_float_exp() {
        let claims = claims(serde_json::json!({"exp": 1_700_000_000.5, "roles": "USER"}));
        assert_eq!(claims.exp, Some(1_700_000_000));
        assert_eq!(claims.roles, vec!["USER"]);
        assert_eq!(claims.known_roles(), vec![Role::User]);
    }

    #[test]
    fn mistyped_expiry_reads_as_missing() {
        let claims = claims(serde_json::json!({"exp": "tomorrow", "roles": ["ADMIN"]}));
        assert_eq!(claims.exp, None);
        assert!(claims.is_expired_at(0));
    }

    #[test]
    fn cached_user_accepts_legacy_mail() {
        let user: CurrentUser = serde_json::from_str(r#"{"id": 1, "acjMail": "a@b.pe"}"#).unwrap();
        assert_eq!(user.email, "a@b.pe");
        assert_eq!(user.label(), "a@b.pe");
    }
}
