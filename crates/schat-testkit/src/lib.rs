//! SChat Testing Infrastructure
//!
//! Shared fixtures for the token and authentication test suites:
//!
//! - `time`: a clock tests can move by hand
//! - `random`: seeded randomness
//! - `keys`: deterministic threshold keysets wired into a registry and signer
//! - `parties`: signing parties that fail, stall or misbehave
//!
//! Add it as a dev-dependency:
//! ```toml
//! [dev-dependencies]
//! schat-testkit = { path = "../schat-testkit" }
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(missing_docs)]

pub mod keys;
pub mod parties;
pub mod random;
pub mod time;

pub use keys::TestKeyset;
pub use parties::{CorruptingParty, SlowParty, UnavailableParty};
pub use random::SeededRandom;
pub use time::ControllableClock;
