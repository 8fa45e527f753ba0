//! Registration, login, refresh and logout
//!
//! Credentials are checked by the caller before [`AuthService::login`]; this
//! service only mints and retires tokens for already-identified users.
//!
//! Registrations are serialized so the k-th user that actually lands in the
//! directory gets the k-th party position. A failed insert claims nothing.

use crate::assignment::PartyAssigner;
use crate::directory::{NewUser, UserDirectory, UserRecord};
use crate::error::AuthError;
use schat_core::UserId;
use schat_token::{RefreshTokenManager, TokenError, TokenIssuer, TokenValidator, UnsignedToken};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU16;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Role granted to every registered user
pub const DEFAULT_ROLE: &str = "ROLE_USER";

/// Token scheme reported to clients
pub const TOKEN_TYPE: &str = "Bearer";

/// Claim carrying the numeric user id
pub const USER_ID_CLAIM: &str = "id";

/// Tokens and profile returned by login and refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokens {
    /// Signed access token in wire form
    pub access_token: String,
    /// Always [`TOKEN_TYPE`]
    pub token_type: String,
    /// Opaque refresh token
    pub refresh_token: String,
    /// Owner of both tokens
    pub user_id: UserId,
    /// Login name, also the token subject
    pub username: String,
    /// Registered e-mail
    pub email: String,
    /// Roles granted to the user
    pub roles: Vec<String>,
}

/// Endpoint-level authentication operations
pub struct AuthService {
    directory: Arc<dyn UserDirectory>,
    assigner: PartyAssigner,
    registration: Mutex<()>,
    issuer: Arc<TokenIssuer>,
    validator: Arc<TokenValidator>,
    refresh: Arc<RefreshTokenManager>,
}

impl AuthService {
    /// Wire the service; the party counter starts at the directory's user count
    pub async fn new(
        directory: Arc<dyn UserDirectory>,
        issuer: Arc<TokenIssuer>,
        validator: Arc<TokenValidator>,
        refresh: Arc<RefreshTokenManager>,
        parties: NonZeroU16,
    ) -> Result<Self, AuthError> {
        let assigner = PartyAssigner::from_directory(parties, directory.as_ref()).await?;
        Ok(Self {
            directory,
            assigner,
            registration: Mutex::new(()),
            issuer,
            validator,
            refresh,
        })
    }

    /// Register a user and assign its signing party
    pub async fn register(&self, username: &str, email: &str) -> Result<UserRecord, AuthError> {
        let _registering = self.registration.lock().await;
        if self.directory.find_by_username(username).await?.is_some() {
            return Err(AuthError::Conflict("username"));
        }
        if self.directory.find_by_email(email).await?.is_some() {
            return Err(AuthError::Conflict("email"));
        }

        let party_index = self.assigner.next_party();
        let user = self
            .directory
            .insert(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                party_index,
            })
            .await?;
        self.assigner.assign_party_for_new_user();

        tracing::info!(user_id = %user.id, party = %party_index, "registered user");
        Ok(user)
    }

    /// Mint an access token and a fresh refresh token for `user`
    pub async fn login(&self, user: &UserRecord) -> Result<AuthTokens, AuthError> {
        let access_token = self.access_token_for(user).await?;
        let refresh_token = self.refresh.issue(user.id).await?;
        tracing::info!(user_id = %user.id, "user logged in");
        Ok(Self::tokens(user, access_token, refresh_token.value))
    }

    /// Exchange a refresh token for a new access token
    pub async fn refresh(&self, refresh_value: &str) -> Result<AuthTokens, AuthError> {
        let redemption = self.refresh.redeem(refresh_value).await?;
        let user = self
            .directory
            .find_by_id(redemption.user_id)
            .await?
            .ok_or(AuthError::UnknownUser)?;
        let access_token = self.access_token_for(&user).await?;
        tracing::debug!(user_id = %user.id, "access token refreshed");
        Ok(Self::tokens(&user, access_token, redemption.refresh_token.value))
    }

    /// Revoke the presented access token and drop its owner's refresh token
    ///
    /// The owner is read from the token's authenticated `id` claim.
    pub async fn logout(&self, access_token: &str) -> Result<UserId, AuthError> {
        let token = self.validator.revoke(access_token).await?;
        let user_id = user_id_of(&token.claims)?;
        self.refresh.revoke_for_user(user_id).await?;
        tracing::info!(%user_id, "user logged out");
        Ok(user_id)
    }

    async fn access_token_for(&self, user: &UserRecord) -> Result<String, AuthError> {
        let claims = BTreeMap::from([
            (USER_ID_CLAIM.to_string(), json!(user.id)),
            ("email".to_string(), Value::from(user.email.as_str())),
            ("roles".to_string(), json!([DEFAULT_ROLE])),
            ("party".to_string(), json!(user.party_index)),
        ]);
        Ok(self.issuer.issue(&user.username, claims).await?.wire)
    }

    fn tokens(user: &UserRecord, access_token: String, refresh_token: String) -> AuthTokens {
        AuthTokens {
            access_token,
            token_type: TOKEN_TYPE.to_string(),
            refresh_token,
            user_id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            roles: vec![DEFAULT_ROLE.to_string()],
        }
    }
}

fn user_id_of(claims: &UnsignedToken) -> Result<UserId, AuthError> {
    claims
        .claims
        .get(USER_ID_CLAIM)
        .and_then(Value::as_u64)
        .map(UserId)
        .ok_or_else(|| TokenError::MalformedClaims("missing user id claim".into()).into())
}

impl fmt::Debug for AuthService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthService")
            .field("assigner", &self.assigner)
            .field("refresh", &self.refresh)
            .finish_non_exhaustive()
    }
}
