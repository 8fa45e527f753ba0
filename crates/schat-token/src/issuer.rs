//! Token issuance: build claims, collect a threshold signature, encode.

use crate::claims::{ClaimsBuilder, UnsignedToken};
use crate::codec::SignedToken;
use crate::error::IssueError;
use schat_threshold::ThresholdSigner;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A freshly minted token
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedToken {
    /// Wire form handed to the client
    pub wire: String,
    /// The claims that were signed
    pub claims: UnsignedToken,
}

/// Mints threshold-signed tokens
pub struct TokenIssuer {
    builder: ClaimsBuilder,
    signer: Arc<ThresholdSigner>,
    default_ttl: Duration,
}

impl TokenIssuer {
    /// Issuer signing with `signer`; tokens live `default_ttl` unless overridden
    pub fn new(
        builder: ClaimsBuilder,
        signer: Arc<ThresholdSigner>,
        default_ttl: Duration,
    ) -> Self {
        Self {
            builder,
            signer,
            default_ttl,
        }
    }

    /// Lifetime used by [`TokenIssuer::issue`]
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Sign prepared claims
    pub async fn sign(&self, unsigned: &UnsignedToken) -> Result<SignedToken, IssueError> {
        let unsigned_part = unsigned
            .canonical_bytes()
            .map_err(|e| IssueError::Claims(e.to_string()))?;
        let signature = self.signer.sign(&unsigned_part).await?;
        Ok(SignedToken {
            unsigned_part,
            signature: signature.to_vec(),
        })
    }

    /// Issue a token for `subject` with the default lifetime
    pub async fn issue(
        &self,
        subject: &str,
        claims: BTreeMap<String, Value>,
    ) -> Result<IssuedToken, IssueError> {
        self.issue_with_ttl(subject, self.default_ttl, claims).await
    }

    /// Issue a token living `ttl` instead of the default
    pub async fn issue_with_ttl(
        &self,
        subject: &str,
        ttl: Duration,
        claims: BTreeMap<String, Value>,
    ) -> Result<IssuedToken, IssueError> {
        let unsigned = self.builder.build(subject, ttl, claims);
        let signed = self.sign(&unsigned).await?;
        tracing::debug!(subject, expires_at = unsigned.expires_at, "issued token");
        Ok(IssuedToken {
            wire: signed.encode(),
            claims: unsigned,
        })
    }
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}
