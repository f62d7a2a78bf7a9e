//! JWT expiry checks.
//!
//! Tokens are opaque signed strings; the only claim this client reads is
//! the expiry timestamp in the payload segment. Signature verification is
//! the server's job. Anything that cannot be decoded is treated as
//! expired, never as valid.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use serde::Deserialize;

use super::AuthError;

/// Claims this client cares about. Unknown claims are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    /// Subject (user id), when present.
    #[serde(default)]
    pub sub: Option<String>,
    /// Expiry as epoch seconds.
    pub exp: i64,
    /// Token kind as minted by the server ("access" or "refresh").
    #[serde(default, rename = "type")]
    pub token_type: Option<String>,
}

/// Decode the payload segment of a JWT without verifying the signature.
pub fn decode(token: &str) -> Result<Claims, AuthError> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| AuthError::MalformedToken("missing payload segment".to_string()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| AuthError::MalformedToken(format!("payload is not base64: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::MalformedToken(format!("payload is not valid claims JSON: {e}")))
}

/// Whether the token's expiry is at or before `now + skew_seconds`.
///
/// Undecodable tokens count as expired.
pub fn is_expired(token: &str, skew_seconds: i64) -> bool {
    match decode(token) {
        Ok(claims) => claims.exp <= Utc::now().timestamp() + skew_seconds,
        Err(_) => true,
    }
}

/// Build an unsigned token with the given expiry offset from now.
/// Shared by tests across the auth and api modules.
#[cfg(test)]
pub(crate) fn encode_test_token(exp_offset_seconds: i64, token_type: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = serde_json::json!({
        "sub": "user-1",
        "exp": Utc::now().timestamp() + exp_offset_seconds,
        "type": token_type,
    });
    let payload = URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes());
    format!("{header}.{payload}.test-signature")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_claims_from_payload() {
        let token = encode_test_token(3600, "access");
        let claims = decode(&token).expect("Failed to decode token");
        assert_eq!(claims.sub.as_deref(), Some("user-1"));
        assert_eq!(claims.token_type.as_deref(), Some("access"));
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn future_expiry_is_not_expired() {
        let token = encode_test_token(3600, "access");
        assert!(!is_expired(&token, 0));
    }

    #[test]
    fn past_expiry_is_expired() {
        let token = encode_test_token(-60, "access");
        assert!(is_expired(&token, 0));
    }

    #[test]
    fn skew_moves_the_expiry_boundary() {
        // Expires in 10s: fresh at zero skew, stale with a 60s skew.
        let token = encode_test_token(10, "access");
        assert!(!is_expired(&token, 0));
        assert!(is_expired(&token, 60));
    }

    #[test]
    fn garbage_is_expired() {
        assert!(is_expired("not-a-token", 0));
        assert!(is_expired("", 0));
        assert!(is_expired("a.b.c", 0));
        // Valid base64 payload but not claims JSON
        let bogus = format!("x.{}.y", URL_SAFE_NO_PAD.encode(b"[1,2,3]"));
        assert!(is_expired(&bogus, 0));
    }

    #[test]
    fn missing_payload_segment_is_malformed() {
        let err = decode("only-one-segment").unwrap_err();
        assert!(matches!(err, AuthError::MalformedToken(_)));
    }
}
