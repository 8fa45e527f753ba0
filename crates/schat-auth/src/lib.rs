//! SChat Authentication
//!
//! The request-facing side of threshold-signed tokens:
//!
//! - `gate`: turns an `Authorization` header into an explicit request identity
//! - `service`: registration, login, refresh and logout
//! - `assignment`: round-robin signing-party assignment for new users
//! - `directory`: the user persistence collaborator
//! - `stack`: builds all of the above from `SchatConfig`
//!
//! Everything is constructed once and shared by handle; there is no ambient
//! "current user". Handlers receive a [`RequestContext`] and call
//! [`RequestIdentity::require`] where authentication is mandatory.

#![forbid(unsafe_code)]

pub mod assignment;
pub mod directory;
pub mod error;
pub mod gate;
pub mod service;
pub mod stack;

pub use assignment::PartyAssigner;
pub use directory::{DirectoryError, InMemoryUserDirectory, NewUser, UserDirectory, UserRecord};
pub use error::{AuthError, Unauthenticated};
pub use gate::{AuthenticatedIdentity, AuthenticationGate, RequestContext, RequestIdentity};
pub use service::{AuthService, AuthTokens, DEFAULT_ROLE, USER_ID_CLAIM};
pub use stack::{AuthStack, Collaborators};
