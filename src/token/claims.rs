// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Expiration parsing for Rancher kubeconfig tokens.
//!
//! Tokens have the shape `<token-name>:<jwt>`. Only the claims segment of the
//! JWT is decoded; the signature is never verified here.

use crate::error::{Result, UpdaterError};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

/// Claims carried in the JWT part of a token
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    /// Expiration time, seconds since the Unix epoch
    #[serde(default)]
    pub exp: i64,
    /// Issued at, seconds since the Unix epoch
    #[serde(default)]
    pub iat: i64,
}

/// Decode the claims of a `<token-name>:<jwt>` credential.
pub fn parse_claims(credential: &str) -> Result<TokenClaims> {
    if credential.is_empty() {
        return Err(UpdaterError::MalformedCredential(
            "token is empty".to_string(),
        ));
    }

    let parts: Vec<&str> = credential.split(':').collect();
    let [_, jwt] = parts.as_slice() else {
        return Err(UpdaterError::MalformedCredential(
            "expected '<token-name>:<jwt-token>'".to_string(),
        ));
    };

    let segments: Vec<&str> = jwt.split('.').collect();
    let [_, payload, _] = segments.as_slice() else {
        return Err(UpdaterError::MalformedCredential(format!(
            "expected 3 JWT segments (header.payload.signature), got {}",
            segments.len()
        )));
    };

    let decoded = URL_SAFE_NO_PAD.decode(payload).map_err(|e| {
        UpdaterError::MalformedCredential(format!("invalid payload encoding: {}", e))
    })?;

    serde_json::from_slice(&decoded)
        .map_err(|e| UpdaterError::MalformedCredential(format!("invalid claims: {}", e)))
}

/// Extract the absolute expiration instant from a credential.
///
/// A zero or absent `exp` claim is reported as [`UpdaterError::MissingExpirationClaim`]
/// rather than treated as a token that never expires.
pub fn parse_expiration(credential: &str) -> Result<DateTime<Utc>> {
    let claims = parse_claims(credential)?;
    if claims.exp == 0 {
        return Err(UpdaterError::MissingExpirationClaim);
    }

    Utc.timestamp_opt(claims.exp, 0).single().ok_or_else(|| {
        UpdaterError::MalformedCredential(format!("exp claim out of range: {}", claims.exp))
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a `<name>:<jwt>` credential with the given JSON claims
    pub(crate) fn make_token(claims: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        let signature = URL_SAFE_NO_PAD.encode(b"signature");
        format!("kubeconfig-u-abc123:{}.{}.{}", header, payload, signature)
    }

    pub(crate) fn make_token_expiring_at(exp: i64) -> String {
        make_token(&serde_json::json!({ "exp": exp, "iat": exp - 90 * 86_400 }))
    }

    #[test]
    fn test_parse_expiration_returns_exact_instant() {
        let exp = 1_893_456_000;
        let token = make_token_expiring_at(exp);

        let expires_at = parse_expiration(&token).unwrap();

        assert_eq!(expires_at.timestamp(), exp);
    }

    #[test]
    fn test_parse_claims_reads_issued_at() {
        let token = make_token(&serde_json::json!({ "exp": 2_000, "iat": 1_000 }));

        let claims = parse_claims(&token).unwrap();

        assert_eq!(claims, TokenClaims { exp: 2_000, iat: 1_000 });
    }

    #[test]
    fn test_parse_expiration_in_the_past_is_still_parsed() {
        let token = make_token_expiring_at(1_000_000);
        assert_eq!(parse_expiration(&token).unwrap().timestamp(), 1_000_000);
    }

    #[test]
    fn test_parse_expiration_empty_token() {
        assert!(matches!(
            parse_expiration(""),
            Err(UpdaterError::MalformedCredential(_))
        ));
    }

    #[test]
    fn test_parse_expiration_without_colon() {
        let token = make_token_expiring_at(1_893_456_000);
        let without_name = token.split_once(':').unwrap().1;

        assert!(matches!(
            parse_expiration(without_name),
            Err(UpdaterError::MalformedCredential(_))
        ));
    }

    #[test]
    fn test_parse_expiration_with_extra_colon() {
        let token = format!("extra:{}", make_token_expiring_at(1_893_456_000));
        assert!(matches!(
            parse_expiration(&token),
            Err(UpdaterError::MalformedCredential(_))
        ));
    }

    #[test]
    fn test_parse_expiration_wrong_segment_count() {
        for jwt in ["onlyone", "two.parts", "a.b.c.d"] {
            let token = format!("name:{}", jwt);
            assert!(
                matches!(
                    parse_expiration(&token),
                    Err(UpdaterError::MalformedCredential(_))
                ),
                "expected malformed for {}",
                jwt
            );
        }
    }

    #[test]
    fn test_parse_expiration_invalid_base64() {
        assert!(matches!(
            parse_expiration("name:header.!!not-base64!!.sig"),
            Err(UpdaterError::MalformedCredential(_))
        ));
    }

    #[test]
    fn test_parse_expiration_invalid_json() {
        let payload = URL_SAFE_NO_PAD.encode(b"not json");
        let token = format!("name:header.{}.sig", payload);

        assert!(matches!(
            parse_expiration(&token),
            Err(UpdaterError::MalformedCredential(_))
        ));
    }

    #[test]
    fn test_parse_expiration_missing_exp() {
        let token = make_token(&serde_json::json!({ "iat": 1_000 }));
        assert!(matches!(
            parse_expiration(&token),
            Err(UpdaterError::MissingExpirationClaim)
        ));
    }

    #[test]
    fn test_parse_expiration_zero_exp() {
        let token = make_token(&serde_json::json!({ "exp": 0 }));
        assert!(matches!(
            parse_expiration(&token),
            Err(UpdaterError::MissingExpirationClaim)
        ));
    }

    #[test]
    fn test_parse_expiration_non_numeric_exp() {
        let token = make_token(&serde_json::json!({ "exp": "tomorrow" }));
        assert!(matches!(
            parse_expiration(&token),
            Err(UpdaterError::MalformedCredential(_))
        ));
    }
}
