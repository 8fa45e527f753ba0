//! Time and randomness effects
//!
//! Components never read the system clock or the OS RNG directly; they take a
//! handler through these traits so tests can substitute controllable ones.
//! Both operations are pure reads that never suspend, so the traits are
//! synchronous.

use rand::RngCore;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch
pub type UnixSeconds = u64;

/// Wall-clock time source for issuance and expiry decisions
pub trait PhysicalClock: Send + Sync {
    /// Current Unix timestamp in seconds
    fn now_secs(&self) -> UnixSeconds;
}

/// Cryptographically secure randomness
pub trait RandomSource: Send + Sync {
    /// Fill and return 32 random bytes
    fn random_bytes_32(&self) -> [u8; 32];
}

/// Production clock backed by `SystemTime`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl PhysicalClock for SystemClock {
    fn now_secs(&self) -> UnixSeconds {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs()
    }
}

/// Production randomness backed by the thread-local CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn random_bytes_32(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes
    }
}

impl<T: PhysicalClock + ?Sized> PhysicalClock for std::sync::Arc<T> {
    fn now_secs(&self) -> UnixSeconds {
        (**self).now_secs()
    }
}

impl<T: RandomSource + ?Sized> RandomSource for std::sync::Arc<T> {
    fn random_bytes_32(&self) -> [u8; 32] {
        (**self).random_bytes_32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now_secs() > 1_577_836_800);
    }

    #[test]
    fn os_random_does_not_repeat() {
        assert_ne!(OsRandom.random_bytes_32(), OsRandom.random_bytes_32());
    }
}
