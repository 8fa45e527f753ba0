//! Party registry
//!
//! Built once at startup and read-only afterwards, so it is shared behind an
//! `Arc` without locking. The registry owns the public key material; secret
//! shares stay inside the parties.

use crate::error::RegistryError;
use crate::frost;
use crate::party::SigningParty;
use schat_core::PartyIndex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Public description of a `t`-of-`n` key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdKeyset {
    /// Total number of parties `n`
    pub parties: u16,
    /// Quorum threshold `t`
    pub threshold: u16,
    /// Group verifying key plus every party's verifying share
    pub public_key_package: frost::keys::PublicKeyPackage,
}

impl ThresholdKeyset {
    /// Combined public key every token signature verifies against
    pub fn combined_public_key(&self) -> &frost::VerifyingKey {
        self.public_key_package.verifying_key()
    }
}

/// Static roster of signing parties
pub struct PartyRegistry {
    keyset: ThresholdKeyset,
    parties: BTreeMap<PartyIndex, Arc<dyn SigningParty>>,
}

impl PartyRegistry {
    /// Validate and freeze the roster.
    ///
    /// Fails when `t < 1`, `t > n`, the keyset disagrees with the number of
    /// parties, or the indices are not exactly `1..=n`.
    pub fn register(
        parties: Vec<Arc<dyn SigningParty>>,
        keyset: ThresholdKeyset,
    ) -> Result<Self, RegistryError> {
        let n = parties.len();
        if keyset.threshold == 0 || usize::from(keyset.threshold) > n {
            return Err(RegistryError::InvalidThreshold {
                threshold: keyset.threshold,
                parties: u16::try_from(n).unwrap_or(u16::MAX),
            });
        }
        if usize::from(keyset.parties) != n {
            return Err(RegistryError::PartyCountMismatch {
                keyset: keyset.parties,
                registered: n,
            });
        }

        let mut roster = BTreeMap::new();
        for party in parties {
            let index = party.index();
            if roster.insert(index, party).is_some() {
                return Err(RegistryError::DuplicateIndex(index));
            }
        }
        for expected in 1..=keyset.parties {
            if !roster.keys().any(|index| index.get() == expected) {
                return Err(RegistryError::MissingIndex(expected));
            }
        }

        tracing::info!(
            parties = keyset.parties,
            threshold = keyset.threshold,
            "party registry initialized"
        );
        Ok(Self {
            keyset,
            parties: roster,
        })
    }

    /// Combined public verification key
    pub fn combined_public_key(&self) -> &frost::VerifyingKey {
        self.keyset.combined_public_key()
    }

    /// Public key material, needed to combine shares
    pub fn keyset(&self) -> &ThresholdKeyset {
        &self.keyset
    }

    /// Look up a party by its index
    pub fn party_by_index(&self, index: PartyIndex) -> Option<&Arc<dyn SigningParty>> {
        self.parties.get(&index)
    }

    /// All parties in index order
    pub fn parties(&self) -> impl Iterator<Item = &Arc<dyn SigningParty>> {
        self.parties.values()
    }

    /// Quorum threshold `t`
    pub fn threshold(&self) -> u16 {
        self.keyset.threshold
    }

    /// Total number of parties `n`
    pub fn party_count(&self) -> u16 {
        self.keyset.parties
    }
}

impl fmt::Debug for PartyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartyRegistry")
            .field("parties", &self.keyset.parties)
            .field("threshold", &self.keyset.threshold)
            .field("indices", &self.parties.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keygen::generate_with_dealer;
    use crate::party::LocalParty;
    use assert_matches::assert_matches;
    use rand_chacha::rand_core::SeedableRng;

    fn dealt(n: u16, t: u16) -> (ThresholdKeyset, Vec<Arc<dyn SigningParty>>) {
        let mut rng = rand_chacha::ChaCha20Rng::seed_from_u64(11);
        let dealt = generate_with_dealer(n, t, &mut rng).unwrap();
        let keyset = dealt.keyset.clone();
        let parties = dealt
            .into_local_parties(LocalParty::DEFAULT_NONCE_TTL)
            .into_iter()
            .map(|p| Arc::new(p) as Arc<dyn SigningParty>)
            .collect();
        (keyset, parties)
    }

    #[test]
    fn registers_contiguous_roster() {
        let (keyset, parties) = dealt(3, 2);
        let registry = PartyRegistry::register(parties, keyset).unwrap();
        assert_eq!(registry.threshold(), 2);
        assert_eq!(registry.party_count(), 3);
        let index = PartyIndex::try_from(3).unwrap();
        assert_eq!(registry.party_by_index(index).map(|p| p.index()), Some(index));
        assert!(registry.party_by_index(PartyIndex::try_from(4).unwrap()).is_none());
    }

    #[test]
    fn threshold_above_party_count_is_rejected() {
        let (mut keyset, parties) = dealt(3, 2);
        keyset.threshold = 4;
        assert_matches!(
            PartyRegistry::register(parties, keyset),
            Err(RegistryError::InvalidThreshold { threshold: 4, .. })
        );
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let (mut keyset, parties) = dealt(3, 2);
        keyset.threshold = 0;
        assert_matches!(
            PartyRegistry::register(parties, keyset),
            Err(RegistryError::InvalidThreshold { .. })
        );
    }

    #[test]
    fn duplicate_index_is_rejected() {
        let (keyset, mut parties) = dealt(3, 2);
        parties[2] = Arc::clone(&parties[0]);
        assert_matches!(
            PartyRegistry::register(parties, keyset),
            Err(RegistryError::DuplicateIndex(_))
        );
    }

    #[test]
    fn gap_in_indices_is_rejected() {
        let (keyset, parties) = dealt(3, 2);
        let (mut small_keyset, small_parties) = dealt(4, 2);
        // Parties 1, 2 and 4 with a keyset claiming three parties.
        let mut roster: Vec<_> = parties.into_iter().take(2).collect();
        roster.push(Arc::clone(&small_parties[3]));
        small_keyset.parties = keyset.parties;
        assert_matches!(
            PartyRegistry::register(roster, small_keyset),
            Err(RegistryError::MissingIndex(3))
        );
    }

    #[test]
    fn keyset_must_match_roster_size() {
        let (keyset, parties) = dealt(3, 2);
        let roster: Vec<_> = parties.into_iter().take(2).collect();
        assert_matches!(
            PartyRegistry::register(roster, keyset),
            Err(RegistryError::PartyCountMismatch { keyset: 3, registered: 2 })
        );
    }
}
