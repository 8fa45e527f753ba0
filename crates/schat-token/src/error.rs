//! Token-layer errors

use schat_core::ErrorKind;
use schat_threshold::SignerError;

/// Outcome of a rejected token, one variant per validation step
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Missing separator or bad base64
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// Combined signature does not verify
    #[error("invalid threshold signature")]
    InvalidSignature,

    /// Signed bytes are not a well-formed claim set
    #[error("malformed claims: {0}")]
    MalformedClaims(String),

    /// `exp` is in the past
    #[error("token expired at {expired_at}")]
    Expired {
        /// The token's `exp`
        expired_at: u64,
    },

    /// Fingerprint is blacklisted
    #[error("token has been revoked")]
    Revoked,

    /// Revocation store failed; the token is rejected
    #[error("revocation lookup failed: {0}")]
    Storage(#[from] StoreError),
}

impl TokenError {
    /// Kind-level category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            TokenError::MalformedToken(_) => ErrorKind::MalformedToken,
            TokenError::InvalidSignature => ErrorKind::InvalidSignature,
            TokenError::MalformedClaims(_) => ErrorKind::MalformedClaims,
            TokenError::Expired { .. } => ErrorKind::Expired,
            TokenError::Revoked => ErrorKind::Revoked,
            TokenError::Storage(_) => ErrorKind::StorageUnavailable,
        }
    }
}

/// Backing-store failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("store unavailable: {0}")]
pub struct StoreError(pub String);

impl StoreError {
    /// Kind-level category of this error
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::StorageUnavailable
    }
}

/// Refresh-token failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    /// Unknown, replaced or already redeemed value
    #[error("refresh token not found")]
    NotFound,

    /// Past its expiry; the stored token is deleted
    #[error("refresh token expired")]
    Expired,

    /// Refresh store failed
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl RefreshError {
    /// Kind-level category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            RefreshError::NotFound => ErrorKind::NotFound,
            RefreshError::Expired => ErrorKind::Expired,
            RefreshError::Storage(_) => ErrorKind::StorageUnavailable,
        }
    }
}

/// Failures while minting a token
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IssueError {
    /// Claims could not be serialized
    #[error("cannot encode claims: {0}")]
    Claims(String),

    /// Quorum signing failed
    #[error(transparent)]
    Signer(#[from] SignerError),
}

impl IssueError {
    /// Kind-level category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            IssueError::Claims(_) => ErrorKind::MalformedClaims,
            IssueError::Signer(e) => e.kind(),
        }
    }
}
