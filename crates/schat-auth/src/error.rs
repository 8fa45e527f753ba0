//! Authentication-service errors

use crate::directory::DirectoryError;
use schat_core::ErrorKind;
use schat_threshold::RegistryError;
use schat_token::{IssueError, RefreshError, StoreError, TokenError};

/// Failure of an authentication-service operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Username or e-mail taken
    #[error("{0} is already registered")]
    Conflict(&'static str),

    /// Token or refresh token names a user the directory does not know
    #[error("user not found")]
    UnknownUser,

    /// Access token rejected
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Access token could not be minted
    #[error(transparent)]
    Issue(#[from] IssueError),

    /// Refresh token rejected
    #[error(transparent)]
    Refresh(#[from] RefreshError),

    /// A backing store failed
    #[error(transparent)]
    Storage(#[from] StoreError),

    /// Registry and configuration disagree; fatal at startup
    #[error(transparent)]
    Configuration(#[from] RegistryError),
}

impl AuthError {
    /// Kind-level category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Conflict(_) => ErrorKind::Conflict,
            AuthError::UnknownUser => ErrorKind::NotFound,
            AuthError::Token(e) => e.kind(),
            AuthError::Issue(e) => e.kind(),
            AuthError::Refresh(e) => e.kind(),
            AuthError::Storage(e) => e.kind(),
            AuthError::Configuration(e) => e.kind(),
        }
    }
}

impl From<DirectoryError> for AuthError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Duplicate(field) => AuthError::Conflict(field),
            DirectoryError::Store(e) => AuthError::Storage(e),
        }
    }
}

/// Returned when a protected operation runs without an authenticated identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("request is not authenticated")]
pub struct Unauthenticated;
