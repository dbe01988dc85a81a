//! Session token codec.
//!
//! Reads the payload segment of a compact `header.payload.signature` token.
//! The signature is never checked here: the API verifies it on every
//! protected request, and a forged token only ever fools this client.
//!
//! Every function is total. Any malformed input (wrong segment count, bad
//! base64, non-JSON or non-object payload) yields "absent", which callers
//! treat exactly like having no session.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;

use crate::claims::{CurrentUser, TokenClaims};

/// URL-safe alphabet, padding optional.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Standard alphabet, padding optional.
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Splits a token into its three segments.
fn segments(token: &str) -> Option<[&str; 3]> {
    let mut parts = token.trim().split('.');
    let header = parts.next()?;
    let payload = parts.next()?;
    let signature = parts.next()?;
    if parts.next().is_some() || payload.is_empty() {
        return None;
    }
    Some([header, payload, signature])
}

/// Decodes one base64 segment into a JSON object.
fn decode_segment(segment: &str) -> Option<serde_json::Map<String, serde_json::Value>> {
    let bytes = URL_SAFE_LENIENT
        .decode(segment)
        .or_else(|_| STANDARD_LENIENT.decode(segment))
        .ok()?;
    match serde_json::from_slice(&bytes).ok()? {
        serde_json::Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Decodes the raw payload of a token.
#[must_use]
pub fn decode_payload(token: &str) -> Option<serde_json::Map<String, serde_json::Value>> {
    let [_, payload, _] = segments(token)?;
    decode_segment(payload)
}

/// Decodes the header of a token.
#[must_use]
pub fn decode_header(token: &str) -> Option<serde_json::Map<String, serde_json::Value>> {
    let [header, _, _] = segments(token)?;
    decode_segment(header)
}

/// Decodes the claims of a token, migrating legacy claim names.
#[must_use]
pub fn decode_claims(token: &str) -> Option<TokenClaims> {
    decode_payload(token).map(TokenClaims::from_payload)
}

/// Role names carried by a token; empty when the token or the claim is
/// missing.
#[must_use]
pub fn roles(token: Option<&str>) -> Vec<String> {
    token
        .and_then(decode_claims)
        .map(|c| c.roles)
        .unwrap_or_default()
}

/// Checks whether a token is present, decodable and unexpired at `now`
/// (Unix seconds).
#[must_use]
pub fn is_valid_at(token: Option<&str>, now: i64) -> bool {
    token
        .and_then(decode_claims)
        .is_some_and(|c| !c.is_expired_at(now))
}

/// Checks whether a token is present, decodable and unexpired.
#[must_use]
pub fn is_valid(token: Option<&str>) -> bool {
    is_valid_at(token, chrono::Utc::now().timestamp())
}

/// Company RUC of the session: token claim first, then the cached user.
#[must_use]
pub fn company_id(token: Option<&str>, cached: Option<&CurrentUser>) -> Option<String> {
    token
        .and_then(decode_claims)
        .and_then(|c| c.empresa_ruc)
        .or_else(|| cached.and_then(|u| u.empresa_ruc.clone()))
}

/// Display name of the session: token claim first, then the cached user.
#[must_use]
pub fn display_name(token: Option<&str>, cached: Option<&CurrentUser>) -> Option<String> {
    token
        .and_then(decode_claims)
        .and_then(|c| c.nombre)
        .or_else(|| cached.and_then(|u| u.nombre.clone()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    /// Builds an unsigned token around `payload`.
    pub(crate) fn make_token(payload: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{header}.{body}.signature")
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    #[test]
    fn malformed_tokens_are_absent() {
        let not_json = URL_SAFE_NO_PAD.encode("not json");
        let array = URL_SAFE_NO_PAD.encode("[1,2]");
        for token in [
            String::new(),
            "abc".to_string(),
            "abc.def".to_string(),
            "a.b.c.d".to_string(),
            "abc.!!!.ghi".to_string(),
            format!("abc.{not_json}.ghi"),
            format!("abc.{array}.ghi"),
            "abc..ghi".to_string(),
        ] {
            assert!(decode_claims(&token).is_none(), "decoded {token:?}");
            assert!(!is_valid(Some(&token)));
            assert!(roles(Some(&token)).is_empty());
        }
    }

    #[test]
    fn padded_and_standard_payloads_decode() {
        let payload = r#"{"exp": 4102444800, "roles": ["USER"], "nombre": "Ñandú?>"}"#.as_bytes();
        let padded = base64::engine::general_purpose::URL_SAFE.encode(payload);
        let standard = base64::engine::general_purpose::STANDARD.encode(payload);
        for body in [padded, standard] {
            let token = format!("h.{body}.s");
            let claims = decode_claims(&token).expect("decodes");
            assert_eq!(claims.roles, vec!["USER"]);
        }
    }

    #[test]
    fn validity_follows_expiry() {
        let past = make_token(&serde_json::json!({"exp": now() - 3600}));
        let future = make_token(&serde_json::json!({"exp": now() + 3600}));
        let no_exp = make_token(&serde_json::json!({"roles": ["ADMIN"]}));
        assert!(!is_valid(Some(&past)));
        assert!(is_valid(Some(&future)));
        assert!(!is_valid(Some(&no_exp)));
        assert!(!is_valid(None));
    }

    #[test]
    fn exact_expiry_is_invalid() {
        let token = make_token(&serde_json::json!({"exp": 1_000}));
        assert!(is_valid_at(Some(&token), 999));
        assert!(!is_valid_at(Some(&token), 1_000));
    }

    #[test]
    fn unused_claims_of_any_type_keep_the_token_valid() {
        let token = make_token(&serde_json::json!({
            "sub": 42,
            "email": ["a@b.pe"],
            "iat": "2024-01-01",
            "exp": now() + 3600,
            "roles": ["ADMIN"]
        }));
        assert!(is_valid(Some(&token)));
        assert_eq!(roles(Some(&token)), vec!["ADMIN"]);
    }

    #[test]
    fn roles_default_to_empty() {
        let token = make_token(&serde_json::json!({"exp": now() + 60}));
        assert!(roles(Some(&token)).is_empty());
        assert!(roles(None).is_empty());
    }

    #[test]
    fn extractor_fallback_chain() {
        let cached = CurrentUser {
            nombre: Some("Cached Name".to_string()),
            empresa_ruc: Some("20000000001".to_string()),
            ..CurrentUser::new(1, "a@b.pe")
        };
        let with_claims = make_token(&serde_json::json!({
            "empresaRuc": "20111111111",
            "name": "Legacy Name"
        }));
        let bare = make_token(&serde_json::json!({"exp": 1}));

        assert_eq!(
            company_id(Some(&with_claims), Some(&cached)).as_deref(),
            Some("20111111111")
        );
        assert_eq!(
            display_name(Some(&with_claims), Some(&cached)).as_deref(),
            Some("Legacy Name")
        );
        assert_eq!(
            company_id(Some(&bare), Some(&cached)).as_deref(),
            Some("20000000001")
        );
        assert_eq!(
            display_name(None, Some(&cached)).as_deref(),
            Some("Cached Name")
        );
        assert!(company_id(Some(&bare), None).is_none());
        assert!(display_name(None, None).is_none());
    }

    #[test]
    fn header_is_readable() {
        let token = make_token(&serde_json::json!({}));
        let header = decode_header(&token).unwrap();
        assert_eq!(header["alg"], "HS256");
    }
}
