//! Per-request authentication
//!
//! The gate never rejects a request. A missing or invalid token leaves the
//! request anonymous, and code guarding a protected resource calls
//! [`RequestIdentity::require`] to reject it there.

use crate::error::Unauthenticated;
use schat_token::{Fingerprint, TokenValidator, UnsignedToken};
use std::sync::Arc;

/// Prefix of an `Authorization` header carrying a bearer token
pub const BEARER_PREFIX: &str = "Bearer ";

/// Identity established from a valid token
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedIdentity {
    /// Token subject (the username)
    pub subject: String,
    /// Full validated claims
    pub claims: UnsignedToken,
    /// Fingerprint of the presented token
    pub fingerprint: Fingerprint,
}

/// Who a request speaks for
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestIdentity {
    /// No token, or a token that failed validation
    #[default]
    Anonymous,
    /// A valid, unrevoked token
    Authenticated(AuthenticatedIdentity),
}

impl RequestIdentity {
    /// The authenticated identity, or [`Unauthenticated`]
    pub fn require(&self) -> Result<&AuthenticatedIdentity, Unauthenticated> {
        match self {
            RequestIdentity::Authenticated(identity) => Ok(identity),
            RequestIdentity::Anonymous => Err(Unauthenticated),
        }
    }

    /// Whether a valid token was presented
    pub fn is_authenticated(&self) -> bool {
        matches!(self, RequestIdentity::Authenticated(_))
    }
}

/// Request-scoped values passed down the handler chain
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestContext {
    /// Identity established by the gate
    pub identity: RequestIdentity,
    /// Raw bearer token, kept for logout
    pub bearer_token: Option<String>,
}

impl RequestContext {
    /// Context for a request without credentials
    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// Extract the token from an `Authorization` header value
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    header?
        .strip_prefix(BEARER_PREFIX)
        .filter(|token| !token.is_empty())
}

/// Runs the validator on each request's bearer token
#[derive(Debug, Clone)]
pub struct AuthenticationGate {
    validator: Arc<TokenValidator>,
}

impl AuthenticationGate {
    /// Gate backed by `validator`
    pub fn new(validator: Arc<TokenValidator>) -> Self {
        Self { validator }
    }

    /// Identity for a request with the given `Authorization` header
    pub async fn authenticate(&self, authorization: Option<&str>) -> RequestIdentity {
        let Some(token) = bearer_token(authorization) else {
            tracing::trace!("no bearer token on request");
            return RequestIdentity::Anonymous;
        };

        match self.validator.validate(token).await {
            Ok(validated) => {
                tracing::debug!(subject = %validated.subject(), "request authenticated");
                RequestIdentity::Authenticated(AuthenticatedIdentity {
                    subject: validated.claims.subject.clone(),
                    claims: validated.claims,
                    fingerprint: validated.fingerprint,
                })
            }
            Err(e) => {
                tracing::warn!(kind = %e.kind(), error = %e, "rejected bearer token");
                RequestIdentity::Anonymous
            }
        }
    }

    /// Build the request context for an `Authorization` header
    pub async fn context_for(&self, authorization: Option<&str>) -> RequestContext {
        RequestContext {
            identity: self.authenticate(authorization).await,
            bearer_token: bearer_token(authorization).map(str::to_owned),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_bearer_scheme_is_recognised() {
        assert_eq!(bearer_token(Some("Bearer abc::def")), Some("abc::def"));
        assert_eq!(bearer_token(Some("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(Some("bearer abc")), None);
        assert_eq!(bearer_token(Some("Bearer ")), None);
        assert_eq!(bearer_token(None), None);
    }

    #[test]
    fn anonymous_identity_fails_require() {
        assert_eq!(RequestIdentity::Anonymous.require(), Err(Unauthenticated));
        assert!(!RequestContext::anonymous().identity.is_authenticated());
    }
}
