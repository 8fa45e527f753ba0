//! `schat` subcommands

pub mod issue;
pub mod keygen;
pub mod verify;

use anyhow::Context;
use schat_core::SchatConfig;
use schat_threshold::{KeyMaterial, PartyRegistry, SigningParty, ThresholdSigner};
use std::path::Path;
use std::sync::Arc;

/// Build an in-process signer from a key-material file
pub fn load_signer(
    config: &SchatConfig,
    keys: Option<&Path>,
) -> anyhow::Result<Arc<ThresholdSigner>> {
    let path = keys
        .or(config.key_material_path.as_deref())
        .context("no key material given; pass --keys or set key_material_path")?;
    let material = KeyMaterial::load(path)?;
    let (keyset, parties) = material.into_local_parties(config.nonce_ttl());
    let parties = parties
        .into_iter()
        .map(|party| Arc::new(party) as Arc<dyn SigningParty>)
        .collect();
    let registry = PartyRegistry::register(parties, keyset)?;
    Ok(Arc::new(ThresholdSigner::new(
        Arc::new(registry),
        config.quorum_timeout(),
    )))
}
