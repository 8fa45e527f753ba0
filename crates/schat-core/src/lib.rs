//! SChat Core
//!
//! Foundation layer for threshold-signed authentication tokens. Everything here
//! is shared by the signing, token and request-authentication layers:
//!
//! - Identifiers: `PartyIndex` (1-based signing party identity) and `UserId`
//! - Error kinds: the kind-level categories surfaced outside the subsystem
//! - Effects: wall-clock and randomness sources, injectable for tests
//! - Configuration: `SchatConfig` loaded from file and `SCHAT_*` environment

#![forbid(unsafe_code)]

/// Identifier types
pub mod types;

/// Kind-level error taxonomy
pub mod errors;

/// Time and randomness effect interfaces with production handlers
pub mod effects;

/// Runtime configuration
pub mod config;

pub use config::{ConfigError, SchatConfig};
pub use effects::{OsRandom, PhysicalClock, RandomSource, SystemClock, UnixSeconds};
pub use errors::ErrorKind;
pub use types::{PartyIndex, UserId};
