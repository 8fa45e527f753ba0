//! Revocation list
//!
//! Tokens are blacklisted by fingerprint until their own expiry. After that
//! the expiry check rejects them anyway, so entries can be dropped.

use crate::error::StoreError;
use async_trait::async_trait;
use parking_lot::RwLock;
use schat_core::{PhysicalClock, UnixSeconds};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// SHA-256 digest of a token's wire form
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Fingerprint of a wire token
    pub fn of(wire: &str) -> Self {
        Self(Sha256::digest(wire.as_bytes()).into())
    }

    /// Raw SHA-256 digest
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", &hex::encode(self.0)[..16])
    }
}

/// Storage for revoked token fingerprints
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Record `fingerprint` as revoked until `expires_at`. Idempotent.
    async fn blacklist(
        &self,
        fingerprint: Fingerprint,
        expires_at: UnixSeconds,
    ) -> Result<(), StoreError>;

    /// Whether `fingerprint` has been revoked
    async fn is_blacklisted(&self, fingerprint: &Fingerprint) -> Result<bool, StoreError>;

    /// Drop entries whose token expired before `now`; returns how many
    async fn purge_expired(&self, now: UnixSeconds) -> Result<usize, StoreError>;
}

/// Process-local revocation list
pub struct InMemoryRevocationStore {
    entries: RwLock<HashMap<Fingerprint, UnixSeconds>>,
    clock: Arc<dyn PhysicalClock>,
}

impl InMemoryRevocationStore {
    /// Empty store pruning against `clock`
    pub fn new(clock: Arc<dyn PhysicalClock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Number of fingerprints currently held
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether no fingerprint is held
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl fmt::Debug for InMemoryRevocationStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryRevocationStore")
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn blacklist(
        &self,
        fingerprint: Fingerprint,
        expires_at: UnixSeconds,
    ) -> Result<(), StoreError> {
        let now = self.clock.now_secs();
        let mut entries = self.entries.write();
        entries.retain(|_, expiry| *expiry >= now);
        let expiry = entries.entry(fingerprint).or_insert(expires_at);
        *expiry = (*expiry).max(expires_at);
        Ok(())
    }

    async fn is_blacklisted(&self, fingerprint: &Fingerprint) -> Result<bool, StoreError> {
        Ok(self.entries.read().contains_key(fingerprint))
    }

    async fn purge_expired(&self, now: UnixSeconds) -> Result<usize, StoreError> {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, expiry| *expiry >= now);
        let purged = before - entries.len();
        if purged > 0 {
            tracing::debug!(purged, "purged expired revocations");
        }
        Ok(purged)
    }
}
