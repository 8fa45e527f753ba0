//! Hand-driven wall clock

use schat_core::{PhysicalClock, UnixSeconds};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// 2023-11-14T22:13:20Z, a fixed starting point for tests
pub const DEFAULT_START: UnixSeconds = 1_700_000_000;

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ControllableClock {
    now: Arc<AtomicU64>,
}

impl ControllableClock {
    pub fn new(start: UnixSeconds) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_secs(), Ordering::SeqCst);
    }

    pub fn set(&self, to: UnixSeconds) {
        self.now.store(to, Ordering::SeqCst);
    }

    pub fn shared(&self) -> Arc<dyn PhysicalClock> {
        Arc::new(self.clone())
    }
}

impl Default for ControllableClock {
    fn default() -> Self {
        Self::new(DEFAULT_START)
    }
}

impl PhysicalClock for ControllableClock {
    fn now_secs(&self) -> UnixSeconds {
        self.now.load(Ordering::SeqCst)
    }
}
