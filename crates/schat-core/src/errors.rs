//! Kind-level error taxonomy
//!
//! Each layer keeps its own detailed error enum for logging. Only the
//! [`ErrorKind`] of a failure is meant to cross the subsystem boundary, so an
//! HTTP layer can map it to a response without learning which check failed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Externally visible category of an authentication failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Wire format violated (missing separator, bad base64)
    MalformedToken,
    /// Combined signature does not verify against the combined public key
    InvalidSignature,
    /// Fewer than `t` parties answered before the signing deadline
    QuorumNotReached,
    /// A single party failed to answer
    PartyUnavailable,
    /// Unsigned part decoded but its claim structure is invalid
    MalformedClaims,
    /// Token or refresh token is past its expiry
    Expired,
    /// Token fingerprint is blacklisted
    Revoked,
    /// Refresh token or user is unknown
    NotFound,
    /// Invalid party registry or configuration, fatal at startup
    ConfigurationError,
    /// A backing store failed; callers fail closed
    StorageUnavailable,
    /// Username or e-mail already registered
    Conflict,
}

impl ErrorKind {
    /// Stable machine-readable name
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::MalformedToken => "malformed_token",
            ErrorKind::InvalidSignature => "invalid_signature",
            ErrorKind::QuorumNotReached => "quorum_not_reached",
            ErrorKind::PartyUnavailable => "party_unavailable",
            ErrorKind::MalformedClaims => "malformed_claims",
            ErrorKind::Expired => "expired",
            ErrorKind::Revoked => "revoked",
            ErrorKind::NotFound => "not_found",
            ErrorKind::ConfigurationError => "configuration_error",
            ErrorKind::StorageUnavailable => "storage_unavailable",
            ErrorKind::Conflict => "conflict",
        }
    }

    /// Whether this failure is fatal at startup rather than per request
    pub fn is_fatal(self) -> bool {
        matches!(self, ErrorKind::ConfigurationError)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_name_matches_display() {
        for kind in [
            ErrorKind::MalformedToken,
            ErrorKind::Revoked,
            ErrorKind::QuorumNotReached,
            ErrorKind::StorageUnavailable,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }

    #[test]
    fn only_configuration_errors_are_fatal() {
        assert!(ErrorKind::ConfigurationError.is_fatal());
        assert!(!ErrorKind::Expired.is_fatal());
    }
}
