//! Signing-party contract and the in-process implementation
//!
//! FROST needs two rounds per signature. In round one a party draws a one-time
//! nonce and publishes its commitment; in round two it receives the signing
//! package (message plus the chosen quorum's commitments) and returns its
//! signature share, consuming the nonce. Whether a party lives in this process
//! or behind a network hop is invisible to the signer.

use crate::error::PartyError;
use crate::frost;
use async_trait::async_trait;
use parking_lot::Mutex;
use schat_core::PartyIndex;
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Identifies one signing attempt; nonces are bound to it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Fresh random session identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Round-one output of one party
#[derive(Debug, Clone)]
pub struct SigningCommitment {
    /// Party that produced the commitment
    pub party_index: PartyIndex,
    /// Public nonce commitments
    pub commitments: frost::round1::SigningCommitments,
}

/// One party's signature share. Never valid as a signature on its own.
#[derive(Debug, Clone)]
pub struct PartialSignature {
    /// Party that produced the share
    pub party_index: PartyIndex,
    /// FROST signature share over the signing package
    pub share: frost::round2::SignatureShare,
}

/// Contract satisfied by every signing party
#[async_trait]
pub trait SigningParty: Send + Sync {
    /// Stable index of this party
    fn index(&self) -> PartyIndex;

    /// Round one: draw a nonce for `session` and return its commitment
    async fn commit(&self, session: SessionId) -> Result<SigningCommitment, PartyError>;

    /// Round two: sign the package with the nonce drawn for `session`
    async fn sign_share(
        &self,
        session: SessionId,
        package: &frost::SigningPackage,
    ) -> Result<PartialSignature, PartyError>;
}

struct PendingNonce {
    nonces: frost::round1::SigningNonces,
    created_at: Instant,
}

/// Party holding its FROST key package in this process
pub struct LocalParty {
    index: PartyIndex,
    key_package: frost::keys::KeyPackage,
    pending: Mutex<HashMap<SessionId, PendingNonce>>,
    nonce_ttl: Duration,
}

impl LocalParty {
    /// Default lifetime of an unused nonce
    pub const DEFAULT_NONCE_TTL: Duration = Duration::from_secs(60);

    /// Create a party from its key package
    pub fn new(index: PartyIndex, key_package: frost::keys::KeyPackage) -> Self {
        Self {
            index,
            key_package,
            pending: Mutex::new(HashMap::new()),
            nonce_ttl: Self::DEFAULT_NONCE_TTL,
        }
    }

    /// Override how long unused nonces are kept
    pub fn with_nonce_ttl(mut self, ttl: Duration) -> Self {
        self.nonce_ttl = ttl;
        self
    }

    /// Number of nonces drawn but not yet consumed
    pub fn pending_nonces(&self) -> usize {
        self.pending.lock().len()
    }

    /// Group verifying key this party's share belongs to
    pub fn group_verifying_key(&self) -> &frost::VerifyingKey {
        self.key_package.verifying_key()
    }
}

impl fmt::Debug for LocalParty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalParty")
            .field("index", &self.index)
            .field("pending_nonces", &self.pending_nonces())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SigningParty for LocalParty {
    fn index(&self) -> PartyIndex {
        self.index
    }

    async fn commit(&self, session: SessionId) -> Result<SigningCommitment, PartyError> {
        let (nonces, commitments) =
            frost::round1::commit(self.key_package.signing_share(), &mut rand::thread_rng());

        let now = Instant::now();
        let mut pending = self.pending.lock();
        // Quorum stragglers never reach round two; drop their nonces.
        pending.retain(|_, nonce| now.duration_since(nonce.created_at) < self.nonce_ttl);
        pending.insert(
            session,
            PendingNonce {
                nonces,
                created_at: now,
            },
        );

        Ok(SigningCommitment {
            party_index: self.index,
            commitments,
        })
    }

    async fn sign_share(
        &self,
        session: SessionId,
        package: &frost::SigningPackage,
    ) -> Result<PartialSignature, PartyError> {
        let pending = self
            .pending
            .lock()
            .remove(&session)
            .ok_or_else(|| PartyError::UnknownSession {
                party: self.index,
                session: session.to_string(),
            })?;

        let share = frost::round2::sign(package, &pending.nonces, &self.key_package).map_err(
            |e| PartyError::Crypto {
                party: self.index,
                reason: e.to_string(),
            },
        )?;

        tracing::trace!(party = %self.index, %session, "produced signature share");
        Ok(PartialSignature {
            party_index: self.index,
            share,
        })
    }
}
