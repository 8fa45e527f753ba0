//! Token claims and their canonical encoding
//!
//! The signed bytes are a compact JSON object with a fixed field order:
//! `alg`, `typ`, `sub`, `iat`, `exp`, then the free-form `claims` map. Maps
//! are ordered by key, so encoding the same claims twice yields identical
//! bytes.

use crate::error::TokenError;
use schat_core::{PhysicalClock, UnixSeconds};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Signature scheme tag written into every token
pub const ALGORITHM: &str = "FROST-ED25519";

/// Token type tag written into every token
pub const TOKEN_TYPE: &str = "schat-tt";

/// Claims of a token before signing
#[derive(Debug, Clone, PartialEq)]
pub struct UnsignedToken {
    /// Principal the token speaks for
    pub subject: String,
    /// Issuance time
    pub issued_at: UnixSeconds,
    /// Expiry time
    pub expires_at: UnixSeconds,
    /// Additional claims
    pub claims: BTreeMap<String, Value>,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct WireClaims {
    alg: String,
    typ: String,
    sub: String,
    iat: UnixSeconds,
    exp: UnixSeconds,
    #[serde(default)]
    claims: BTreeMap<String, Value>,
}

impl UnsignedToken {
    /// Bytes covered by the threshold signature
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, TokenError> {
        let wire = WireClaims {
            alg: ALGORITHM.into(),
            typ: TOKEN_TYPE.into(),
            sub: self.subject.clone(),
            iat: self.issued_at,
            exp: self.expires_at,
            claims: self.claims.clone(),
        };
        serde_json::to_vec(&wire).map_err(|e| TokenError::MalformedClaims(e.to_string()))
    }

    /// Parse claims previously produced by [`UnsignedToken::canonical_bytes`]
    pub fn parse(bytes: &[u8]) -> Result<Self, TokenError> {
        let wire: WireClaims = serde_json::from_slice(bytes)
            .map_err(|e| TokenError::MalformedClaims(e.to_string()))?;

        if wire.alg != ALGORITHM {
            return Err(TokenError::MalformedClaims(format!(
                "unsupported algorithm {}",
                wire.alg
            )));
        }
        if wire.typ != TOKEN_TYPE {
            return Err(TokenError::MalformedClaims(format!(
                "unexpected token type {}",
                wire.typ
            )));
        }
        if wire.sub.is_empty() {
            return Err(TokenError::MalformedClaims("empty subject".into()));
        }
        if wire.exp < wire.iat {
            return Err(TokenError::MalformedClaims(format!(
                "expiry {} precedes issuance {}",
                wire.exp, wire.iat
            )));
        }

        Ok(Self {
            subject: wire.sub,
            issued_at: wire.iat,
            expires_at: wire.exp,
            claims: wire.claims,
        })
    }

    /// Look up a string-valued claim
    pub fn claim_str(&self, name: &str) -> Option<&str> {
        self.claims.get(name).and_then(Value::as_str)
    }

    /// Whether the token has expired at `now`
    pub fn is_expired_at(&self, now: UnixSeconds) -> bool {
        self.expires_at < now
    }
}

/// Assembles claims against the injected clock
#[derive(Clone)]
pub struct ClaimsBuilder {
    clock: Arc<dyn PhysicalClock>,
}

impl ClaimsBuilder {
    /// Builder stamping `iat` from `clock`
    pub fn new(clock: Arc<dyn PhysicalClock>) -> Self {
        Self { clock }
    }

    /// Claims for `subject` valid for `ttl` from now
    pub fn build(
        &self,
        subject: impl Into<String>,
        ttl: Duration,
        claims: BTreeMap<String, Value>,
    ) -> UnsignedToken {
        let issued_at = self.clock.now_secs();
        UnsignedToken {
            subject: subject.into(),
            issued_at,
            expires_at: issued_at.saturating_add(ttl.as_secs()),
            claims,
        }
    }
}

impl std::fmt::Debug for ClaimsBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimsBuilder").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    struct FixedClock(UnixSeconds);

    impl PhysicalClock for FixedClock {
        fn now_secs(&self) -> UnixSeconds {
            self.0
        }
    }

    fn sample() -> UnsignedToken {
        let mut claims = BTreeMap::new();
        claims.insert("roles".to_string(), json!(["ROLE_USER"]));
        claims.insert("email".to_string(), json!("alice@example.com"));
        ClaimsBuilder::new(Arc::new(FixedClock(1_700_000_000))).build(
            "alice",
            Duration::from_secs(3600),
            claims,
        )
    }

    #[test]
    fn builder_stamps_clock_time() {
        let token = sample();
        assert_eq!(token.issued_at, 1_700_000_000);
        assert_eq!(token.expires_at, 1_700_003_600);
    }

    #[test]
    fn canonical_encoding_has_fixed_layout() {
        let bytes = sample().canonical_bytes().unwrap();
        assert_eq!(
            std::str::from_utf8(&bytes).unwrap(),
            r#"{"alg":"FROST-ED25519","typ":"schat-tt","sub":"alice","iat":1700000000,"exp":1700003600,"claims":{"email":"alice@example.com","roles":["ROLE_USER"]}}"#
        );
    }

    #[test]
    fn parse_inverts_canonical_encoding() {
        let token = sample();
        let parsed = UnsignedToken::parse(&token.canonical_bytes().unwrap()).unwrap();
        assert_eq!(parsed, token);
        assert_eq!(parsed.claim_str("email"), Some("alice@example.com"));
    }

    #[test]
    fn parse_rejects_bad_payloads() {
        assert_matches!(UnsignedToken::parse(b"not json"), Err(TokenError::MalformedClaims(_)));
        assert_matches!(
            UnsignedToken::parse(br#"{"alg":"HS256","typ":"schat-tt","sub":"a","iat":1,"exp":2}"#),
            Err(TokenError::MalformedClaims(_))
        );
        assert_matches!(
            UnsignedToken::parse(br#"{"alg":"FROST-ED25519","typ":"jwt","sub":"a","iat":1,"exp":2}"#),
            Err(TokenError::MalformedClaims(_))
        );
        assert_matches!(
            UnsignedToken::parse(br#"{"alg":"FROST-ED25519","typ":"schat-tt","sub":"","iat":1,"exp":2}"#),
            Err(TokenError::MalformedClaims(_))
        );
        assert_matches!(
            UnsignedToken::parse(br#"{"alg":"FROST-ED25519","typ":"schat-tt","sub":"a","iat":5,"exp":2}"#),
            Err(TokenError::MalformedClaims(_))
        );
    }

    #[test]
    fn expiry_is_strict() {
        let token = sample();
        assert!(!token.is_expired_at(token.expires_at));
        assert!(token.is_expired_at(token.expires_at + 1));
    }
}
