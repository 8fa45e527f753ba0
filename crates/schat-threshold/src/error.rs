//! Errors for registry setup, party calls and quorum signing

use schat_core::{ErrorKind, PartyIndex};

/// Invalid party roster or key material. Fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Threshold is zero or exceeds the party count
    #[error("invalid threshold {threshold} for {parties} parties")]
    InvalidThreshold {
        /// Requested threshold
        threshold: u16,
        /// Party count
        parties: u16,
    },

    /// Two parties claim the same index
    #[error("duplicate party index {0}")]
    DuplicateIndex(PartyIndex),

    /// Indices must run 1..=n without gaps
    #[error("party indices are not contiguous from 1: missing {0}")]
    MissingIndex(u16),

    /// Roster size differs from the keyset
    #[error("keyset describes {keyset} parties but {registered} were registered")]
    PartyCountMismatch {
        /// Parties the keyset was dealt for
        keyset: u16,
        /// Parties handed to the registry
        registered: usize,
    },

    /// Key material could not be generated, read or written
    #[error("key material error: {0}")]
    KeyMaterial(String),

    /// Registry roster disagrees with the configured `n` or `t`
    #[error(
        "registry is {threshold}-of-{parties} but configuration expects \
         {configured_threshold}-of-{configured_parties}"
    )]
    ConfigMismatch {
        /// `parties` from configuration
        configured_parties: u16,
        /// `threshold` from configuration
        configured_threshold: u16,
        /// Parties in the registry
        parties: u16,
        /// Threshold of the registry's keyset
        threshold: u16,
    },
}

impl RegistryError {
    /// Kind-level category of this error
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::ConfigurationError
    }
}

/// Failure of a single party call. Recoverable while a quorum remains.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PartyError {
    /// The party did not answer
    #[error("party {party} unavailable: {reason}")]
    Unavailable {
        /// Party that failed
        party: PartyIndex,
        /// Transport or service error text
        reason: String,
    },

    /// No party with this index is registered
    #[error("party {0} is not registered")]
    UnknownParty(PartyIndex),

    /// Round two arrived without a live round-one nonce
    #[error("party {party} has no pending nonce for session {session}")]
    UnknownSession {
        /// Party that was asked
        party: PartyIndex,
        /// Session the nonce was expected under
        session: String,
    },

    /// The share computation itself failed
    #[error("party {party} failed to produce a share: {reason}")]
    Crypto {
        /// Party that failed
        party: PartyIndex,
        /// FROST error text
        reason: String,
    },
}

impl PartyError {
    /// Kind-level category of this error
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::PartyUnavailable
    }

    /// Party the failure is attributed to
    pub fn party(&self) -> PartyIndex {
        match self {
            PartyError::Unavailable { party, .. }
            | PartyError::UnknownSession { party, .. }
            | PartyError::Crypto { party, .. } => *party,
            PartyError::UnknownParty(party) => *party,
        }
    }
}

/// Quorum signing failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignerError {
    /// Fewer than `t` parties completed both rounds before the deadline
    #[error("quorum not reached: {responded} of {required} required parties responded")]
    QuorumNotReached {
        /// The threshold `t`
        required: usize,
        /// Parties that were still usable when signing gave up
        responded: usize,
    },

    /// Aggregation failed without naming a culprit
    #[error("signature combination failed: {0}")]
    Combine(String),
}

impl SignerError {
    /// Kind-level category of this error
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::QuorumNotReached
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        let party = PartyIndex::try_from(2).unwrap();
        let err = PartyError::Unavailable {
            party,
            reason: "connection refused".into(),
        };
        assert_eq!(err.kind(), ErrorKind::PartyUnavailable);
        assert_eq!(err.party(), party);

        let err = SignerError::QuorumNotReached {
            required: 2,
            responded: 1,
        };
        assert_eq!(err.kind(), ErrorKind::QuorumNotReached);
        assert_eq!(
            RegistryError::MissingIndex(3).kind(),
            ErrorKind::ConfigurationError
        );
    }
}
