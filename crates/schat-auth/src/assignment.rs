//! Round-robin party assignment
//!
//! The k-th registered user (1-based) gets party `((k - 1) mod n) + 1`. The
//! counter is claimed with one atomic increment, so concurrent registrations
//! never observe the same position.

use crate::directory::UserDirectory;
use schat_core::PartyIndex;
use schat_token::StoreError;
use std::num::NonZeroU16;
use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out party indices in registration order
#[derive(Debug)]
pub struct PartyAssigner {
    parties: NonZeroU16,
    registered: AtomicU64,
}

impl PartyAssigner {
    /// Start after `registered` users have already been assigned
    pub fn new(parties: NonZeroU16, registered: u64) -> Self {
        Self {
            parties,
            registered: AtomicU64::new(registered),
        }
    }

    /// Seed the counter from the directory's user count
    pub async fn from_directory(
        parties: NonZeroU16,
        directory: &dyn UserDirectory,
    ) -> Result<Self, StoreError> {
        let registered = directory.current_user_count().await?;
        tracing::debug!(parties = parties.get(), registered, "seeded party assigner");
        Ok(Self::new(parties, registered))
    }

    /// Party the next claimed position maps to, without claiming it
    pub fn next_party(&self) -> PartyIndex {
        Self::party_for_position(self.registered.load(Ordering::SeqCst), self.parties)
    }

    /// Claim the next position and return its party
    pub fn assign_party_for_new_user(&self) -> PartyIndex {
        let position = self.registered.fetch_add(1, Ordering::SeqCst);
        Self::party_for_position(position, self.parties)
    }

    /// Party of the user at zero-based `position`
    pub fn party_for_position(position: u64, parties: NonZeroU16) -> PartyIndex {
        // The remainder is below `parties`, so it always fits in a u16.
        let offset = u16::try_from(position % u64::from(parties.get())).unwrap_or_default();
        PartyIndex::new(NonZeroU16::MIN.saturating_add(offset))
    }

    /// Users assigned so far
    pub fn registered(&self) -> u64 {
        self.registered.load(Ordering::SeqCst)
    }
}
