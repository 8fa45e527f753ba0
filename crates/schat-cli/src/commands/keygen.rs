//! `schat keygen`: deal key material to a file

use anyhow::Context;
use schat_threshold::{generate_with_dealer, KeyMaterial};
use std::path::Path;

pub fn run(parties: u16, threshold: u16, output: &Path) -> anyhow::Result<()> {
    let dealt = generate_with_dealer(parties, threshold, &mut rand::thread_rng())?;
    let public_key = dealt.keyset.combined_public_key().serialize();
    KeyMaterial::from(dealt)
        .save(output)
        .with_context(|| format!("writing key material to {}", output.display()))?;

    println!("Generated {threshold}-of-{parties} keyset");
    println!("Combined public key: {}", hex::encode(public_key));
    println!("Key material: {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use schat_threshold::LocalParty;

    #[test]
    fn writes_loadable_key_material() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.json");
        run(3, 2, &path).unwrap();

        let (keyset, parties) = KeyMaterial::load(&path)
            .unwrap()
            .into_local_parties(LocalParty::DEFAULT_NONCE_TTL);
        assert_eq!((keyset.parties, keyset.threshold), (3, 2));
        assert_eq!(parties.len(), 3);
    }

    #[test]
    fn rejects_threshold_above_parties() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(2, 3, &dir.path().join("keys.json")).is_err());
    }
}
