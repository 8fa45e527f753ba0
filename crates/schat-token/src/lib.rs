//! SChat Tokens
//!
//! Bearer tokens whose signature is produced by a quorum of signing parties.
//!
//! - `claims`: the signed payload and its canonical byte encoding
//! - `codec`: the `claims::signature` wire form
//! - `issuer`: build, sign and encode in one step
//! - `validator`: the ordered validation pipeline and revocation entry point
//! - `revocation`: fingerprint blacklist with an in-memory store
//! - `refresh`: opaque refresh tokens, one per user

#![forbid(unsafe_code)]

pub mod claims;
pub mod codec;
pub mod error;
pub mod issuer;
pub mod refresh;
pub mod revocation;
pub mod validator;

pub use claims::{ClaimsBuilder, UnsignedToken, ALGORITHM, TOKEN_TYPE};
pub use codec::{SignedToken, SEPARATOR};
pub use error::{IssueError, RefreshError, StoreError, TokenError};
pub use issuer::{IssuedToken, TokenIssuer};
pub use refresh::{
    InMemoryRefreshTokenStore, Redemption, RefreshToken, RefreshTokenManager, RefreshTokenStore,
    RotationPolicy,
};
pub use revocation::{Fingerprint, InMemoryRevocationStore, RevocationStore};
pub use validator::{AuthenticToken, TokenValidator, ValidatedClaims};
