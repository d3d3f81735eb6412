//! Session token validation
//!
//! Validation runs in two steps. The token is first verified and decoded
//! generically (signature, expiry, issuer, claim shape). The embedded
//! permission object is then recovered independently from the decoded body
//! segment and replaces whatever the generic decode produced, so the
//! returned scope is exactly the bytes that were signed.

use crate::token::claims::{SessionClaims, PERMISSIONS_CLAIM};
use crate::token::key::SigningKey;
use base64::{engine::general_purpose::URL_SAFE, Engine};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use tracing::debug;
use turnstile_core::config::TokenConfig;
use turnstile_core::types::Permission;
use turnstile_core::{Error, Result, TOKEN_ISSUER};

/// Verifies session tokens and recovers their claims
#[derive(Clone)]
pub struct TokenValidator {
    key: SigningKey,
    validation: Validation,
}

impl TokenValidator {
    pub fn new(key: SigningKey) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss"]);

        Self { key, validation }
    }

    pub fn from_config(config: &TokenConfig) -> Result<Self> {
        let key = SigningKey::from_config(config)?;
        Ok(Self::new(key).with_leeway(config.leeway_seconds))
    }

    pub fn with_leeway(mut self, leeway_seconds: u64) -> Self {
        self.validation.leeway = leeway_seconds;
        self
    }

    /// Validate `token` and return its claims with the permission populated
    pub fn validate(&self, token: &str) -> Result<SessionClaims> {
        if token.is_empty() {
            return Err(Error::EmptyToken);
        }

        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 {
            return Err(Error::ImproperlyFormattedToken);
        }

        decode_header(token).map_err(|_| Error::MalformedToken)?;

        let data = decode::<SessionClaims>(token, &self.key.decoding_key(), &self.validation)
            .map_err(|e| {
                debug!("Token rejected: {}", e);
                classify(e)
            })?;

        let mut claims = data.claims;
        let permission = recover_permission(segments[1])?;

        if claims.permissions.as_ref() != Some(&permission) {
            debug!("Generic decode disagreed with recovered permission, using recovered");
        }
        claims.permissions = Some(permission);

        Ok(claims)
    }
}

fn classify(err: jsonwebtoken::errors::Error) -> Error {
    match err.kind() {
        JwtErrorKind::InvalidToken | JwtErrorKind::Base64(_) | JwtErrorKind::Utf8(_) => {
            Error::MalformedToken
        }
        JwtErrorKind::ExpiredSignature | JwtErrorKind::ImmatureSignature => Error::TokenExpired,
        JwtErrorKind::Json(_) | JwtErrorKind::MissingRequiredClaim(_) => Error::NonClaimToken,
        _ => Error::UnhandledToken,
    }
}

/// Recover the embedded permission from the base64url claim segment.
///
/// The claim body is `{...,"Permissions":{...}}`; the value runs from just
/// after the field marker to the closing brace of the outer object.
fn recover_permission(body_segment: &str) -> Result<Permission> {
    let mut body = body_segment.to_string();
    let trailing = body.len() % 4;
    if trailing != 0 {
        body.push_str(&"=".repeat(4 - trailing));
    }

    let decoded = URL_SAFE
        .decode(body.as_bytes())
        .map_err(|e| Error::TokenPayload(e.to_string()))?;
    let text = String::from_utf8(decoded).map_err(|e| Error::TokenPayload(e.to_string()))?;

    let marker = format!("\"{}\":", PERMISSIONS_CLAIM);
    let start = text
        .find(&marker)
        .map(|idx| idx + marker.len())
        .ok_or_else(|| Error::TokenPayload(format!("missing {} claim", PERMISSIONS_CLAIM)))?;

    let outer = text
        .trim_end()
        .strip_suffix('}')
        .ok_or_else(|| Error::TokenPayload("claim body is not an object".to_string()))?;
    let value = outer
        .get(start..)
        .ok_or_else(|| Error::TokenPayload("claim body truncated".to_string()))?;

    serde_json::from_str(value).map_err(|e| Error::TokenPayload(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use turnstile_core::types::Role;

    const KEY: &str = "validator-test-key";

    fn validator() -> TokenValidator {
        TokenValidator::new(SigningKey::new(KEY).unwrap())
    }

    fn permission() -> Permission {
        let mut perm = Permission::new("user-1", "org-7")
            .with_role(Role::Reader)
            .with_role(Role::VulnerabilityAdmin);
        perm.created_by = Some("seed?>>>".to_string());
        perm
    }

    fn sign<T: serde::Serialize>(claims: &T, alg: Algorithm, key: &str) -> String {
        encode(
            &Header::new(alg),
            claims,
            &EncodingKey::from_secret(key.as_bytes()),
        )
        .unwrap()
    }

    fn claims_expiring_in(seconds: i64) -> SessionClaims {
        SessionClaims {
            iss: TOKEN_ISSUER.to_string(),
            exp: Utc::now().timestamp() + seconds,
            permissions: Some(permission()),
        }
    }

    #[test]
    fn test_valid_token_round_trip() {
        let claims = claims_expiring_in(3600);
        let token = sign(&claims, Algorithm::HS256, KEY);

        let validated = validator().validate(&token).unwrap();
        assert_eq!(validated, claims);
    }

    #[test]
    fn test_empty_token() {
        assert!(matches!(validator().validate(""), Err(Error::EmptyToken)));
    }

    #[test]
    fn test_wrong_segment_count() {
        let token = sign(&claims_expiring_in(3600), Algorithm::HS256, KEY);
        let parts: Vec<&str> = token.split('.').collect();

        let two = format!("{}.{}", parts[0], parts[1]);
        let four = format!("{}.extra", token);

        assert!(matches!(
            validator().validate(&two),
            Err(Error::ImproperlyFormattedToken)
        ));
        assert!(matches!(
            validator().validate(&four),
            Err(Error::ImproperlyFormattedToken)
        ));
        assert!(matches!(
            validator().validate("not-a-token"),
            Err(Error::ImproperlyFormattedToken)
        ));
    }

    #[test]
    fn test_garbage_segments_are_non_token() {
        assert!(matches!(
            validator().validate("a.b.c"),
            Err(Error::MalformedToken)
        ));
    }

    #[test]
    fn test_expired_token() {
        let token = sign(&claims_expiring_in(-120), Algorithm::HS256, KEY);
        assert!(matches!(validator().validate(&token), Err(Error::TokenExpired)));
    }

    #[test]
    fn test_not_yet_active_token() {
        let claims = serde_json::json!({
            "iss": TOKEN_ISSUER,
            "exp": Utc::now().timestamp() + 7200,
            "nbf": Utc::now().timestamp() + 3600,
            "Permissions": permission(),
        });
        let token = sign(&claims, Algorithm::HS256, KEY);

        let err = validator().validate(&token).unwrap_err();
        assert!(matches!(err, Error::TokenExpired));
        assert_eq!(err.to_string(), "Token is either expired or not active yet");
    }

    #[test]
    fn test_leeway_accepts_recent_expiry() {
        let token = sign(&claims_expiring_in(-30), Algorithm::HS256, KEY);
        assert!(validator().with_leeway(60).validate(&token).is_ok());
    }

    #[test]
    fn test_bad_signature() {
        let token = sign(&claims_expiring_in(3600), Algorithm::HS256, "other-key");
        assert!(matches!(validator().validate(&token), Err(Error::UnhandledToken)));
    }

    #[test]
    fn test_tampered_payload() {
        let token = sign(&claims_expiring_in(3600), Algorithm::HS256, KEY);
        let parts: Vec<&str> = token.split('.').collect();

        let mut forged = claims_expiring_in(3600);
        if let Some(perm) = forged.permissions.as_mut() {
            perm.admin = true;
        }
        let body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());
        let tampered = format!("{}.{}.{}", parts[0], body, parts[2]);

        assert!(matches!(
            validator().validate(&tampered),
            Err(Error::UnhandledToken)
        ));
    }

    #[test]
    fn test_wrong_algorithm() {
        let token = sign(&claims_expiring_in(3600), Algorithm::HS512, KEY);
        assert!(matches!(validator().validate(&token), Err(Error::UnhandledToken)));
    }

    #[test]
    fn test_wrong_issuer() {
        let mut claims = claims_expiring_in(3600);
        claims.iss = "someone-else".to_string();
        let token = sign(&claims, Algorithm::HS256, KEY);

        assert!(matches!(validator().validate(&token), Err(Error::UnhandledToken)));
    }

    #[test]
    fn test_claim_shape_mismatch() {
        let claims = serde_json::json!({
            "iss": TOKEN_ISSUER,
            "exp": Utc::now().timestamp() + 3600,
            "Permissions": "admin",
        });
        let token = sign(&claims, Algorithm::HS256, KEY);
        assert!(matches!(validator().validate(&token), Err(Error::NonClaimToken)));

        let no_exp = serde_json::json!({ "iss": TOKEN_ISSUER });
        let token = sign(&no_exp, Algorithm::HS256, KEY);
        assert!(matches!(validator().validate(&token), Err(Error::NonClaimToken)));
    }

    #[test]
    fn test_missing_permissions_claim() {
        let claims = serde_json::json!({
            "iss": TOKEN_ISSUER,
            "exp": Utc::now().timestamp() + 3600,
        });
        let token = sign(&claims, Algorithm::HS256, KEY);

        assert!(matches!(validator().validate(&token), Err(Error::TokenPayload(_))));
    }

    #[test]
    fn test_recover_permission_restores_padding() {
        let perm = permission();
        let claims = SessionClaims {
            iss: TOKEN_ISSUER.to_string(),
            exp: 1,
            permissions: Some(perm.clone()),
        };
        let json = serde_json::to_vec(&claims).unwrap();

        // exercise every possible amount of stripped padding
        for extra in 0..4 {
            let mut claims = claims.clone();
            claims.iss.push_str(&"x".repeat(extra));
            let json = serde_json::to_vec(&claims).unwrap();
            let segment = URL_SAFE_NO_PAD.encode(&json);

            assert_eq!(recover_permission(&segment).unwrap(), perm);
        }

        assert!(recover_permission(&URL_SAFE_NO_PAD.encode(&json[..json.len() - 1])).is_err());
    }

    #[test]
    fn test_from_config() {
        let config = TokenConfig::default();
        assert!(matches!(
            TokenValidator::from_config(&config),
            Err(Error::SigningKeyNotInitialized)
        ));

        let config = TokenConfig {
            signing_key: Some(KEY.to_string()),
            leeway_seconds: 60,
            ..Default::default()
        };
        let token = sign(&claims_expiring_in(-30), Algorithm::HS256, KEY);
        assert!(TokenValidator::from_config(&config).unwrap().validate(&token).is_ok());
    }
}
