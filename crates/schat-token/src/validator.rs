//! Token validation
//!
//! Checks run in a fixed order and stop at the first failure: split, combined
//! signature, claims, expiry, revocation. Nothing inside the claims is read
//! before the signature has been verified.

use crate::claims::UnsignedToken;
use crate::codec::SignedToken;
use crate::error::TokenError;
use crate::revocation::{Fingerprint, RevocationStore};
use schat_core::PhysicalClock;
use schat_threshold::ThresholdSigner;
use std::fmt;
use std::sync::Arc;

/// Claims of a token that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedClaims {
    /// Authenticated claims
    pub claims: UnsignedToken,
    /// Fingerprint of the wire token
    pub fingerprint: Fingerprint,
}

impl ValidatedClaims {
    /// Subject the token was issued to
    pub fn subject(&self) -> &str {
        &self.claims.subject
    }
}

/// Claims of a token whose signature verified.
///
/// Expiry and revocation have not been checked; only [`TokenValidator::validate`]
/// produces [`ValidatedClaims`].
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticToken {
    /// Signed claims
    pub claims: UnsignedToken,
    /// Fingerprint of the wire token
    pub fingerprint: Fingerprint,
}

/// Verifies wire tokens against the combined public key
pub struct TokenValidator {
    signer: Arc<ThresholdSigner>,
    revocations: Arc<dyn RevocationStore>,
    clock: Arc<dyn PhysicalClock>,
}

impl TokenValidator {
    /// Validator checking signatures against `signer`'s combined key
    pub fn new(
        signer: Arc<ThresholdSigner>,
        revocations: Arc<dyn RevocationStore>,
        clock: Arc<dyn PhysicalClock>,
    ) -> Self {
        Self {
            signer,
            revocations,
            clock,
        }
    }

    /// Split, verify and parse without looking at expiry or revocation
    pub(crate) fn authenticate(&self, wire: &str) -> Result<AuthenticToken, TokenError> {
        let signed = SignedToken::decode(wire)?;
        if !self.signer.verify(&signed.unsigned_part, &signed.signature) {
            return Err(TokenError::InvalidSignature);
        }
        let claims = UnsignedToken::parse(&signed.unsigned_part)?;
        Ok(AuthenticToken {
            claims,
            fingerprint: Fingerprint::of(wire),
        })
    }

    /// Full validation. A failing revocation store rejects the token.
    pub async fn validate(&self, wire: &str) -> Result<ValidatedClaims, TokenError> {
        let AuthenticToken {
            claims,
            fingerprint,
        } = self.authenticate(wire)?;

        if claims.is_expired_at(self.clock.now_secs()) {
            return Err(TokenError::Expired {
                expired_at: claims.expires_at,
            });
        }

        if self.revocations.is_blacklisted(&fingerprint).await? {
            return Err(TokenError::Revoked);
        }

        Ok(ValidatedClaims {
            claims,
            fingerprint,
        })
    }

    /// Blacklist an authentic token until its expiry.
    ///
    /// Tokens that are already expired need no entry and succeed as a no-op.
    /// Returns the authenticated claims so callers can act on the token's owner.
    pub async fn revoke(&self, wire: &str) -> Result<AuthenticToken, TokenError> {
        let token = self.authenticate(wire)?;
        if token.claims.is_expired_at(self.clock.now_secs()) {
            tracing::debug!(
                fingerprint = %token.fingerprint,
                "skipping revocation of expired token"
            );
            return Ok(token);
        }
        self.revocations
            .blacklist(token.fingerprint, token.claims.expires_at)
            .await?;
        tracing::info!(
            subject = %token.claims.subject,
            fingerprint = %token.fingerprint,
            "token revoked"
        );
        Ok(token)
    }
}

impl fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenValidator")
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}
