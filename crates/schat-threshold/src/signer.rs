//! Quorum signer
//!
//! `sign` asks every registered party for a round-one commitment at once and
//! keeps the first `t` that succeed. Those `t` are asked for shares, and the
//! shares are combined into one Ed25519 signature. A party that fails in
//! round two, or whose share is rejected while combining, is excluded and a
//! new session starts with the rest. One deadline bounds the whole call;
//! outstanding party requests are dropped when it passes or once enough
//! answers have arrived.

use crate::error::{PartyError, SignerError};
use crate::frost;
use crate::party::{PartialSignature, SessionId, SigningCommitment, SigningParty};
use crate::registry::PartyRegistry;
use futures::stream::{FuturesUnordered, StreamExt};
use schat_core::PartyIndex;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

/// Length of a combined signature in bytes
pub const SIGNATURE_LENGTH: usize = 64;

/// Combined threshold signature (standard Ed25519 encoding)
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CombinedSignature([u8; SIGNATURE_LENGTH]);

impl CombinedSignature {
    /// Parse from raw bytes; `None` on wrong length
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; SIGNATURE_LENGTH]>::try_from(bytes).ok().map(Self)
    }

    /// Raw signature bytes
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    /// Copy into a vector
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl From<frost::Signature> for CombinedSignature {
    fn from(signature: frost::Signature) -> Self {
        Self(signature.serialize())
    }
}

impl fmt::Debug for CombinedSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CombinedSignature({:02x}{:02x}…)", self.0[0], self.0[1])
    }
}

/// Verify `signature` over `message` against a combined public key.
///
/// Pure and deterministic; needs no party key material.
pub fn verify_combined(
    public_key: &frost::VerifyingKey,
    message: &[u8],
    signature: &[u8],
) -> bool {
    let Some(bytes) = CombinedSignature::from_slice(signature) else {
        return false;
    };
    match frost::Signature::deserialize(bytes.0) {
        Ok(signature) => public_key.verify(message, &signature).is_ok(),
        Err(_) => false,
    }
}

enum ShareRound {
    Complete(BTreeMap<PartyIndex, PartialSignature>),
    Failed(Vec<PartyIndex>),
}

/// Coordinates quorum signing over a [`PartyRegistry`]
#[derive(Debug, Clone)]
pub struct ThresholdSigner {
    registry: Arc<PartyRegistry>,
    quorum_timeout: Duration,
}

impl ThresholdSigner {
    /// Create a signer with a per-call deadline
    pub fn new(registry: Arc<PartyRegistry>, quorum_timeout: Duration) -> Self {
        Self {
            registry,
            quorum_timeout,
        }
    }

    /// Registry this signer draws parties from
    pub fn registry(&self) -> &Arc<PartyRegistry> {
        &self.registry
    }

    /// Round-one request to a single party
    pub async fn request_commitment(
        &self,
        party_index: PartyIndex,
        session: SessionId,
    ) -> Result<SigningCommitment, PartyError> {
        let party = self
            .registry
            .party_by_index(party_index)
            .ok_or(PartyError::UnknownParty(party_index))?;
        party.commit(session).await
    }

    /// Round-two request to a single party
    pub async fn request_partial_signature(
        &self,
        party_index: PartyIndex,
        session: SessionId,
        package: &frost::SigningPackage,
    ) -> Result<PartialSignature, PartyError> {
        let party = self
            .registry
            .party_by_index(party_index)
            .ok_or(PartyError::UnknownParty(party_index))?;
        party.sign_share(session, package).await
    }

    /// Check a combined signature against the registry's combined public key
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        verify_combined(self.registry.combined_public_key(), message, signature)
    }

    /// Gather a quorum and produce a combined signature over `message`
    pub async fn sign(&self, message: &[u8]) -> Result<CombinedSignature, SignerError> {
        let deadline = Instant::now() + self.quorum_timeout;
        let threshold = usize::from(self.registry.threshold());
        let mut excluded: BTreeSet<PartyIndex> = BTreeSet::new();

        loop {
            let candidates: Vec<Arc<dyn SigningParty>> = self
                .registry
                .parties()
                .filter(|party| !excluded.contains(&party.index()))
                .cloned()
                .collect();
            if candidates.len() < threshold {
                tracing::error!(
                    required = threshold,
                    available = candidates.len(),
                    "not enough parties left to reach quorum"
                );
                return Err(SignerError::QuorumNotReached {
                    required: threshold,
                    responded: candidates.len(),
                });
            }

            let session = SessionId::new();
            let commitments = self
                .gather_commitments(&candidates, session, threshold, deadline, &mut excluded)
                .await?;

            let mut frost_commitments = BTreeMap::new();
            let mut identifiers = BTreeMap::new();
            for (index, commitment) in &commitments {
                let id = crate::identifier(*index)
                    .map_err(|e| SignerError::Combine(format!("invalid identifier: {e}")))?;
                frost_commitments.insert(id, commitment.commitments.clone());
                identifiers.insert(id, *index);
            }
            let package = Arc::new(frost::SigningPackage::new(frost_commitments, message));

            let shares = match self
                .gather_shares(&candidates, &commitments, session, &package, deadline)
                .await?
            {
                ShareRound::Complete(shares) => shares,
                ShareRound::Failed(failed) => {
                    excluded.extend(failed);
                    continue;
                }
            };

            let mut frost_shares = BTreeMap::new();
            for (index, partial) in &shares {
                let id = crate::identifier(*index)
                    .map_err(|e| SignerError::Combine(format!("invalid identifier: {e}")))?;
                frost_shares.insert(id, partial.share.clone());
            }

            match frost::aggregate(
                &package,
                &frost_shares,
                &self.registry.keyset().public_key_package,
            ) {
                Ok(signature) => {
                    tracing::debug!(
                        %session,
                        signers = ?shares.keys().map(|i| i.get()).collect::<Vec<_>>(),
                        "combined threshold signature"
                    );
                    return Ok(CombinedSignature::from(signature));
                }
                Err(frost::Error::InvalidSignatureShare { culprit }) => {
                    match identifiers.get(&culprit) {
                        Some(index) => {
                            tracing::warn!(
                                party = %index,
                                %session,
                                "rejected invalid signature share"
                            );
                            excluded.insert(*index);
                        }
                        None => {
                            return Err(SignerError::Combine(
                                "invalid share from unknown signer".to_string(),
                            ))
                        }
                    }
                }
                Err(e) => return Err(SignerError::Combine(e.to_string())),
            }
        }
    }

    async fn gather_commitments(
        &self,
        candidates: &[Arc<dyn SigningParty>],
        session: SessionId,
        threshold: usize,
        deadline: Instant,
        excluded: &mut BTreeSet<PartyIndex>,
    ) -> Result<BTreeMap<PartyIndex, SigningCommitment>, SignerError> {
        let mut pending: FuturesUnordered<_> = candidates
            .iter()
            .map(|party| {
                let party = Arc::clone(party);
                async move { (party.index(), party.commit(session).await) }
            })
            .collect();

        let mut accepted = BTreeMap::new();
        while accepted.len() < threshold {
            match timeout_at(deadline, pending.next()).await {
                Ok(Some((index, Ok(commitment)))) => {
                    accepted.insert(index, commitment);
                }
                Ok(Some((index, Err(e)))) => {
                    tracing::warn!(party = %index, error = %e, "party failed to commit");
                    excluded.insert(index);
                }
                Ok(None) => break,
                Err(_) => {
                    tracing::error!(
                        %session,
                        required = threshold,
                        responded = accepted.len(),
                        "signing deadline passed while gathering commitments"
                    );
                    return Err(SignerError::QuorumNotReached {
                        required: threshold,
                        responded: accepted.len(),
                    });
                }
            }
        }

        if accepted.len() < threshold {
            tracing::error!(
                %session,
                required = threshold,
                responded = accepted.len(),
                "too few parties committed"
            );
            return Err(SignerError::QuorumNotReached {
                required: threshold,
                responded: accepted.len(),
            });
        }
        Ok(accepted)
    }

    async fn gather_shares(
        &self,
        candidates: &[Arc<dyn SigningParty>],
        quorum: &BTreeMap<PartyIndex, SigningCommitment>,
        session: SessionId,
        package: &Arc<frost::SigningPackage>,
        deadline: Instant,
    ) -> Result<ShareRound, SignerError> {
        let mut pending: FuturesUnordered<_> = candidates
            .iter()
            .filter(|party| quorum.contains_key(&party.index()))
            .map(|party| {
                let party = Arc::clone(party);
                let package = Arc::clone(package);
                async move { (party.index(), party.sign_share(session, &package).await) }
            })
            .collect();

        let mut shares = BTreeMap::new();
        let mut failed = Vec::new();
        loop {
            match timeout_at(deadline, pending.next()).await {
                Ok(Some((index, Ok(partial)))) => {
                    shares.insert(index, partial);
                }
                Ok(Some((index, Err(e)))) => {
                    tracing::warn!(party = %index, error = %e, "party failed to sign");
                    failed.push(index);
                }
                Ok(None) => break,
                Err(_) => {
                    tracing::error!(
                        %session,
                        required = quorum.len(),
                        responded = shares.len(),
                        "signing deadline passed while gathering shares"
                    );
                    return Err(SignerError::QuorumNotReached {
                        required: quorum.len(),
                        responded: shares.len(),
                    });
                }
            }
        }

        if failed.is_empty() {
            Ok(ShareRound::Complete(shares))
        } else {
            Ok(ShareRound::Failed(failed))
        }
    }
}
