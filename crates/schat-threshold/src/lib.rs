//! SChat Threshold Signing
//!
//! Tokens are signed by a quorum of independent parties instead of one key.
//! This crate holds the pieces that coordinate that quorum:
//!
//! - `registry`: the immutable roster of parties plus the combined public key
//! - `party`: the contract every signing party satisfies, and a local
//!   implementation holding a FROST key share
//! - `signer`: concurrent quorum gathering, share combination and verification
//! - `keygen`: trusted-dealer key generation and key-material files
//!
//! The concrete scheme is FROST over Ed25519. A combined signature is an
//! ordinary Ed25519 signature, so verification is a single check against the
//! group verifying key no matter which `t` parties contributed.

#![forbid(unsafe_code)]

pub mod error;
pub mod keygen;
pub mod party;
pub mod registry;
pub mod signer;

pub use error::{PartyError, RegistryError, SignerError};
pub use keygen::{generate_with_dealer, DealtKeys, KeyMaterial};
pub use party::{LocalParty, PartialSignature, SessionId, SigningCommitment, SigningParty};
pub use registry::{PartyRegistry, ThresholdKeyset};
pub use signer::{CombinedSignature, ThresholdSigner};

/// Re-export of the FROST ciphersuite used for all key material
pub use frost_ed25519 as frost;

use schat_core::PartyIndex;

/// FROST identifier for a party index
pub(crate) fn identifier(index: PartyIndex) -> Result<frost::Identifier, frost::Error> {
    frost::Identifier::try_from(index.get())
}
