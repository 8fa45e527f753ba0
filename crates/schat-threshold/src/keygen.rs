//! Trusted-dealer key generation and key-material files
//!
//! A dealer splits one Ed25519 key into `n` FROST shares with threshold `t`.
//! FROST cannot express `t = 1`, so the dealer needs `t >= 2`.

use crate::error::RegistryError;
use crate::frost;
use crate::party::LocalParty;
use crate::registry::ThresholdKeyset;
use rand::{CryptoRng, RngCore};
use schat_core::PartyIndex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Output of dealer key generation
#[derive(Debug, Clone)]
pub struct DealtKeys {
    /// Public key material
    pub keyset: ThresholdKeyset,
    /// One key package per party index
    pub key_packages: BTreeMap<PartyIndex, frost::keys::KeyPackage>,
}

impl DealtKeys {
    /// Wrap every key package in an in-process party
    pub fn into_local_parties(self, nonce_ttl: Duration) -> Vec<LocalParty> {
        self.key_packages
            .into_iter()
            .map(|(index, key_package)| {
                LocalParty::new(index, key_package).with_nonce_ttl(nonce_ttl)
            })
            .collect()
    }
}

/// Split a fresh signing key into `parties` shares with quorum `threshold`
pub fn generate_with_dealer<R: RngCore + CryptoRng>(
    parties: u16,
    threshold: u16,
    rng: &mut R,
) -> Result<DealtKeys, RegistryError> {
    if threshold < 2 || threshold > parties {
        return Err(RegistryError::InvalidThreshold { threshold, parties });
    }

    let (mut shares, public_key_package) = frost::keys::generate_with_dealer(
        parties,
        threshold,
        frost::keys::IdentifierList::Default,
        rng,
    )
    .map_err(|e| RegistryError::KeyMaterial(format!("dealer key generation failed: {e}")))?;

    let mut key_packages = BTreeMap::new();
    for index in PartyIndex::range(parties) {
        let id = crate::identifier(index)
            .map_err(|e| RegistryError::KeyMaterial(format!("invalid identifier {index}: {e}")))?;
        let share = shares.remove(&id).ok_or(RegistryError::MissingIndex(index.get()))?;
        let key_package = frost::keys::KeyPackage::try_from(share)
            .map_err(|e| RegistryError::KeyMaterial(format!("invalid share for {index}: {e}")))?;
        key_packages.insert(index, key_package);
    }

    tracing::info!(parties, threshold, "generated threshold keyset with dealer");
    Ok(DealtKeys {
        keyset: ThresholdKeyset {
            parties,
            threshold,
            public_key_package,
        },
        key_packages,
    })
}

/// Serialized key material for one deployment.
///
/// Holding every share in one file is only appropriate for single-host setups
/// and tooling; distributed deployments give each party host its own package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyMaterial {
    /// Public key material
    pub keyset: ThresholdKeyset,
    /// Secret key packages by party
    pub key_packages: Vec<PartyKeyPackage>,
}

/// Key package of one party
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyKeyPackage {
    /// Index the package belongs to
    pub index: PartyIndex,
    /// FROST key package (secret share plus public data)
    pub key_package: frost::keys::KeyPackage,
}

impl From<DealtKeys> for KeyMaterial {
    fn from(dealt: DealtKeys) -> Self {
        Self {
            keyset: dealt.keyset,
            key_packages: dealt
                .key_packages
                .into_iter()
                .map(|(index, key_package)| PartyKeyPackage { index, key_package })
                .collect(),
        }
    }
}

impl KeyMaterial {
    /// Read key material from a JSON file
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RegistryError::KeyMaterial(format!("failed to read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| RegistryError::KeyMaterial(format!("invalid key material: {e}")))
    }

    /// Write key material as JSON
    pub fn save(&self, path: &Path) -> Result<(), RegistryError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| RegistryError::KeyMaterial(format!("failed to serialize: {e}")))?;
        std::fs::write(path, json).map_err(|e| {
            RegistryError::KeyMaterial(format!("failed to write {}: {e}", path.display()))
        })
    }

    /// Rebuild in-process parties from the stored packages
    pub fn into_local_parties(self, nonce_ttl: Duration) -> (ThresholdKeyset, Vec<LocalParty>) {
        let parties = self
            .key_packages
            .into_iter()
            .map(|p| LocalParty::new(p.index, p.key_package).with_nonce_ttl(nonce_ttl))
            .collect();
        (self.keyset, parties)
    }
}
