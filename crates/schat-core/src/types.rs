//! Identifier types shared across layers.

use crate::errors::ErrorKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU16;

/// Stable 1-based index of a signing party.
///
/// The index is the party's identity for user assignment and for attributing
/// partial signatures. It must be non-zero, which also makes it a valid FROST
/// identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct PartyIndex(NonZeroU16);

impl PartyIndex {
    /// Create a party index from a non-zero value
    pub fn new(index: NonZeroU16) -> Self {
        Self(index)
    }

    /// Get the index as u16
    pub fn get(self) -> u16 {
        self.0.get()
    }

    /// Iterate over the indices `1..=n`
    pub fn range(n: u16) -> impl Iterator<Item = PartyIndex> {
        (1..=n).filter_map(NonZeroU16::new).map(PartyIndex)
    }
}

/// Error returned when converting zero into a [`PartyIndex`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("party index must be non-zero")]
pub struct ZeroPartyIndex;

impl ZeroPartyIndex {
    /// Kind-level category of this error
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::ConfigurationError
    }
}

impl TryFrom<u16> for PartyIndex {
    type Error = ZeroPartyIndex;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        NonZeroU16::new(value).map(PartyIndex).ok_or(ZeroPartyIndex)
    }
}

impl From<PartyIndex> for u16 {
    fn from(index: PartyIndex) -> Self {
        index.get()
    }
}

impl fmt::Display for PartyIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a registered user, assigned by the persistence layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_not_a_party_index() {
        assert_eq!(PartyIndex::try_from(0), Err(ZeroPartyIndex));
        assert_eq!(PartyIndex::try_from(3).map(PartyIndex::get), Ok(3));
    }

    #[test]
    fn range_is_one_based_and_inclusive() {
        let indices: Vec<u16> = PartyIndex::range(3).map(PartyIndex::get).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(PartyIndex::range(0).count(), 0);
    }

    #[test]
    fn party_index_serde_rejects_zero() {
        let parsed: Result<PartyIndex, _> = serde_json::from_str("0");
        assert!(parsed.is_err());
        let parsed: PartyIndex = serde_json::from_str("2").unwrap();
        assert_eq!(parsed.get(), 2);
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "2");
    }
}
