//! Clock abstraction so timer choreography is testable without wall-clock
//! waits.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// A source of cooperative sleeps
#[async_trait]
pub trait Clock: Send + Sync {
    /// Sleep for the given duration
    async fn sleep(&self, duration: Duration);
}

/// Real clock backed by the tokio timer
#[derive(Debug, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Manually advanced clock for tests. Sleeps suspend until `advance` moves
/// virtual time past their deadline.
#[derive(Debug, Default)]
pub struct VirtualClock {
    now: Mutex<Duration>,
    advanced: Notify,
}

impl VirtualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Total virtual time elapsed
    pub fn elapsed(&self) -> Duration {
        *self.now.lock()
    }

    /// Move virtual time forward, waking any sleeps whose deadline passed
    pub fn advance(&self, duration: Duration) {
        *self.now.lock() += duration;
        self.advanced.notify_waiters();
    }
}

#[async_trait]
impl Clock for VirtualClock {
    async fn sleep(&self, duration: Duration) {
        let deadline = *self.now.lock() + duration;
        loop {
            // Register interest before re-checking, so an advance between the
            // check and the await cannot be missed.
            let notified = self.advanced.notified();
            if *self.now.lock() >= deadline {
                return;
            }
            notified.await;
        }
    }
}
