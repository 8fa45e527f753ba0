//! Deterministic threshold keysets

use crate::parties::UnavailableParty;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use schat_core::PartyIndex;
use schat_threshold::{
    generate_with_dealer, LocalParty, PartyRegistry, SigningParty, ThresholdKeyset,
    ThresholdSigner,
};
use std::sync::Arc;
use std::time::Duration;

/// Quorum deadline used by fixtures unless overridden
pub const TEST_QUORUM_TIMEOUT: Duration = Duration::from_secs(2);

/// A dealt keyset whose parties all live in the test process
#[derive(Debug, Clone)]
pub struct TestKeyset {
    pub keyset: ThresholdKeyset,
    pub parties: Vec<Arc<LocalParty>>,
}

impl TestKeyset {
    /// `threshold`-of-`parties` keyset from a fixed seed
    pub fn generate(parties: u16, threshold: u16) -> Self {
        Self::with_seed(parties, threshold, 42)
    }

    pub fn with_seed(parties: u16, threshold: u16, seed: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let dealt = generate_with_dealer(parties, threshold, &mut rng)
            .expect("test keyset parameters are valid");
        let keyset = dealt.keyset.clone();
        let parties = dealt
            .into_local_parties(LocalParty::DEFAULT_NONCE_TTL)
            .into_iter()
            .map(Arc::new)
            .collect();
        Self { keyset, parties }
    }

    pub fn party(&self, index: u16) -> Arc<LocalParty> {
        self.parties
            .iter()
            .find(|p| p.index().get() == index)
            .cloned()
            .expect("party index within keyset")
    }

    /// Registry with every party honest
    pub fn registry(&self) -> Arc<PartyRegistry> {
        self.registry_with(|party| party)
    }

    /// Registry where `wrap` may replace each honest party
    pub fn registry_with<F>(&self, wrap: F) -> Arc<PartyRegistry>
    where
        F: Fn(Arc<dyn SigningParty>) -> Arc<dyn SigningParty>,
    {
        let parties = self
            .parties
            .iter()
            .map(|p| wrap(Arc::clone(p) as Arc<dyn SigningParty>))
            .collect();
        Arc::new(
            PartyRegistry::register(parties, self.keyset.clone())
                .expect("test roster is contiguous"),
        )
    }

    pub fn signer(&self) -> Arc<ThresholdSigner> {
        Arc::new(ThresholdSigner::new(self.registry(), TEST_QUORUM_TIMEOUT))
    }

    /// Signer whose listed parties refuse every request
    pub fn signer_with_offline(&self, offline: &[u16]) -> Arc<ThresholdSigner> {
        let registry = self.registry_with(|party| {
            if offline.contains(&party.index().get()) {
                Arc::new(UnavailableParty::new(party.index()))
            } else {
                party
            }
        });
        Arc::new(ThresholdSigner::new(registry, TEST_QUORUM_TIMEOUT))
    }

    /// Signer where only the listed parties are reachable
    pub fn signer_with_only(&self, online: &[u16]) -> Arc<ThresholdSigner> {
        let offline: Vec<u16> = PartyIndex::range(self.keyset.parties)
            .map(|i| i.get())
            .filter(|i| !online.contains(i))
            .collect();
        self.signer_with_offline(&offline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parties::{CorruptingParty, SlowParty};
    use assert_matches::assert_matches;
    use schat_threshold::SignerError;

    #[test]
    fn same_seed_same_public_key() {
        let a = TestKeyset::with_seed(3, 2, 5);
        let b = TestKeyset::with_seed(3, 2, 5);
        assert_eq!(a.keyset.combined_public_key(), b.keyset.combined_public_key());
    }

    #[tokio::test]
    async fn disjoint_quorums_share_one_public_key() {
        let keys = TestKeyset::generate(3, 2);
        let low = keys.signer_with_only(&[1, 2]);
        let high = keys.signer_with_only(&[2, 3]);
        let a = low.sign(b"message").await.unwrap();
        let b = high.sign(b"message").await.unwrap();
        assert!(low.verify(b"message", b.as_bytes()));
        assert!(high.verify(b"message", a.as_bytes()));
    }

    #[tokio::test]
    async fn corrupting_party_is_excluded() {
        let keys = TestKeyset::generate(3, 2);
        let registry = keys.registry_with(|party| {
            if party.index().get() == 1 {
                Arc::new(CorruptingParty::new(party))
            } else {
                party
            }
        });
        let signer = ThresholdSigner::new(registry, TEST_QUORUM_TIMEOUT);
        let signature = signer.sign(b"message").await.unwrap();
        assert!(signer.verify(b"message", signature.as_bytes()));
    }

    #[tokio::test]
    async fn quorum_of_fast_parties_does_not_wait_for_straggler() {
        let straggler_delay = Duration::from_secs(3);
        let keys = TestKeyset::generate(3, 2);
        let registry = keys.registry_with(|party| {
            if party.index().get() == 3 {
                Arc::new(SlowParty::new(party, straggler_delay))
            } else {
                party
            }
        });
        let signer = ThresholdSigner::new(registry, Duration::from_secs(10));

        let started = std::time::Instant::now();
        let signature = signer.sign(b"message").await.unwrap();
        let elapsed = started.elapsed();

        assert!(
            elapsed < straggler_delay / 3,
            "signing waited {elapsed:?} for the straggler"
        );
        assert!(signer.verify(b"message", signature.as_bytes()));
        assert!(keys.signer().verify(b"message", signature.as_bytes()));
    }

    #[tokio::test]
    async fn slow_majority_misses_deadline() {
        let keys = TestKeyset::generate(3, 2);
        let registry = keys.registry_with(|party| {
            if party.index().get() == 1 {
                party
            } else {
                Arc::new(SlowParty::new(party, Duration::from_secs(5)))
            }
        });
        let signer = ThresholdSigner::new(registry, Duration::from_millis(100));
        assert_matches!(
            signer.sign(b"message").await,
            Err(SignerError::QuorumNotReached { required: 2, .. })
        );
    }
}
