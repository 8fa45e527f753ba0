//! Refresh tokens
//!
//! Opaque random values bound to one user, at most one live token per user.
//! Issuing a new token replaces the previous one. A redeemed token either
//! stays valid until logout or is rotated, depending on [`RotationPolicy`].

use crate::error::{RefreshError, StoreError};
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use parking_lot::Mutex;
use schat_core::{PhysicalClock, RandomSource, UnixSeconds, UserId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use zeroize::Zeroize;

/// A stored refresh token
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshToken {
    /// Opaque value handed to the client
    pub value: String,
    /// Owner
    pub user_id: UserId,
    /// Expiry time
    pub expires_at: UnixSeconds,
}

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshToken")
            .field("user_id", &self.user_id)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Persistence for refresh tokens
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Store `token` as the user's only token, returning the one it replaced
    async fn replace_for_user(
        &self,
        token: RefreshToken,
    ) -> Result<Option<RefreshToken>, StoreError>;

    /// Swap `current` for `next` only if `current` is still the user's token
    async fn rotate(&self, current: &str, next: RefreshToken) -> Result<bool, StoreError>;

    /// Look up a token by its value
    async fn find_by_value(&self, value: &str) -> Result<Option<RefreshToken>, StoreError>;

    /// Delete by value; returns whether anything was removed
    async fn remove_value(&self, value: &str) -> Result<bool, StoreError>;

    /// Delete the user's token; returns whether anything was removed
    async fn remove_for_user(&self, user_id: UserId) -> Result<bool, StoreError>;
}

#[derive(Default)]
struct RefreshIndex {
    by_value: HashMap<String, RefreshToken>,
    by_user: HashMap<UserId, String>,
}

impl RefreshIndex {
    fn remove_user(&mut self, user_id: UserId) -> Option<RefreshToken> {
        let value = self.by_user.remove(&user_id)?;
        self.by_value.remove(&value)
    }

    fn insert(&mut self, token: RefreshToken) {
        self.by_user.insert(token.user_id, token.value.clone());
        self.by_value.insert(token.value.clone(), token);
    }
}

/// Process-local refresh-token store. Both indices sit behind one lock.
#[derive(Default)]
pub struct InMemoryRefreshTokenStore {
    inner: Mutex<RefreshIndex>,
}

impl InMemoryRefreshTokenStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live tokens
    pub fn len(&self) -> usize {
        self.inner.lock().by_value.len()
    }

    /// Whether no token is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for InMemoryRefreshTokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryRefreshTokenStore")
            .field("tokens", &self.len())
            .finish()
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn replace_for_user(
        &self,
        token: RefreshToken,
    ) -> Result<Option<RefreshToken>, StoreError> {
        let mut inner = self.inner.lock();
        let previous = inner.remove_user(token.user_id);
        inner.insert(token);
        Ok(previous)
    }

    async fn rotate(&self, current: &str, next: RefreshToken) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock();
        if inner.by_user.get(&next.user_id).map(String::as_str) != Some(current) {
            return Ok(false);
        }
        inner.remove_user(next.user_id);
        inner.insert(next);
        Ok(true)
    }

    async fn find_by_value(&self, value: &str) -> Result<Option<RefreshToken>, StoreError> {
        Ok(self.inner.lock().by_value.get(value).cloned())
    }

    async fn remove_value(&self, value: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock();
        match inner.by_value.remove(value) {
            Some(token) => {
                inner.by_user.remove(&token.user_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_for_user(&self, user_id: UserId) -> Result<bool, StoreError> {
        Ok(self.inner.lock().remove_user(user_id).is_some())
    }
}

/// What happens to a refresh token once redeemed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationPolicy {
    /// The token stays valid until it expires or the user logs out
    #[default]
    KeepUntilLogout,
    /// Every redemption invalidates the token and returns a new one
    RotateOnRedeem,
}

impl RotationPolicy {
    /// Policy selected by the `rotate_refresh_on_redeem` setting
    pub fn from_flag(rotate: bool) -> Self {
        if rotate {
            Self::RotateOnRedeem
        } else {
            Self::KeepUntilLogout
        }
    }
}

/// Result of redeeming a refresh token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redemption {
    /// Owner of the redeemed token
    pub user_id: UserId,
    /// Refresh token the client should keep using
    pub refresh_token: RefreshToken,
}

/// Issues, redeems and revokes refresh tokens
pub struct RefreshTokenManager {
    store: Arc<dyn RefreshTokenStore>,
    clock: Arc<dyn PhysicalClock>,
    random: Arc<dyn RandomSource>,
    ttl: Duration,
    policy: RotationPolicy,
}

impl RefreshTokenManager {
    /// Manager issuing tokens valid for `ttl`, kept until logout
    pub fn new(
        store: Arc<dyn RefreshTokenStore>,
        clock: Arc<dyn PhysicalClock>,
        random: Arc<dyn RandomSource>,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            random,
            ttl,
            policy: RotationPolicy::default(),
        }
    }

    /// Replace the rotation policy
    pub fn with_policy(mut self, policy: RotationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Current rotation policy
    pub fn policy(&self) -> RotationPolicy {
        self.policy
    }

    fn mint(&self, user_id: UserId) -> RefreshToken {
        let mut secret = self.random.random_bytes_32();
        let value = URL_SAFE_NO_PAD.encode(secret);
        secret.zeroize();
        RefreshToken {
            value,
            user_id,
            expires_at: self.clock.now_secs().saturating_add(self.ttl.as_secs()),
        }
    }

    /// Issue a fresh token for `user_id`, replacing any previous one
    pub async fn issue(&self, user_id: UserId) -> Result<RefreshToken, RefreshError> {
        let token = self.mint(user_id);
        if self.store.replace_for_user(token.clone()).await?.is_some() {
            tracing::debug!(%user_id, "replaced previous refresh token");
        }
        Ok(token)
    }

    /// Redeem `value`. Expired tokens are deleted on sight.
    pub async fn redeem(&self, value: &str) -> Result<Redemption, RefreshError> {
        let token = self
            .store
            .find_by_value(value)
            .await?
            .ok_or(RefreshError::NotFound)?;

        if token.expires_at < self.clock.now_secs() {
            self.store.remove_value(value).await?;
            tracing::debug!(user_id = %token.user_id, "refresh token expired");
            return Err(RefreshError::Expired);
        }

        let refresh_token = match self.policy {
            RotationPolicy::KeepUntilLogout => token,
            RotationPolicy::RotateOnRedeem => {
                let next = self.mint(token.user_id);
                if !self.store.rotate(value, next.clone()).await? {
                    return Err(RefreshError::NotFound);
                }
                next
            }
        };

        Ok(Redemption {
            user_id: refresh_token.user_id,
            refresh_token,
        })
    }

    /// Delete the user's refresh token; returns whether one existed
    pub async fn revoke_for_user(&self, user_id: UserId) -> Result<bool, RefreshError> {
        Ok(self.store.remove_for_user(user_id).await?)
    }
}

impl fmt::Debug for RefreshTokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshTokenManager")
            .field("ttl", &self.ttl)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
