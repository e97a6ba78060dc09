//! Process-wide gate for outbound calls to external services.
//!
//! Every request to the geocoder or the waiting-time service goes through a
//! single shared `RateLimiter`. At most `max_in_flight` calls run at once
//! (one by default), and a slot only becomes free again after `cooldown` has
//! elapsed since the protected call finished. Concurrent lookups therefore
//! queue behind each other, which keeps us inside the public Nominatim
//! usage policy regardless of how many requests arrive.
//!
//! Share via `Arc<RateLimiter>` across async tasks.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

// =============================================================================
// RateLimiter
// =============================================================================

/// Configuration for the shared limiter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimiterConfig {
    pub max_in_flight: usize,
    pub cooldown: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_in_flight: crate::defaults::RATE_LIMIT_MAX_IN_FLIGHT,
            cooldown: Duration::from_millis(crate::defaults::RATE_LIMIT_COOLDOWN_MS),
        }
    }
}

/// Counting gate with a mandatory cool-down after each call.
pub struct RateLimiter {
    permits: Arc<Semaphore>,
    cooldown: Duration,
    last_release: Arc<Mutex<Option<Instant>>>,
}

impl RateLimiter {
    pub fn new(max_in_flight: usize, cooldown: Duration) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
            cooldown,
            last_release: Arc::new(Mutex::new(None)),
        }
    }

    pub fn from_config(config: RateLimiterConfig) -> Self {
        Self::new(config.max_in_flight, config.cooldown)
    }

    /// Block until this task holds a slot.
    pub async fn acquire(&self) -> RateLimitPermit {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .expect("rate limiter semaphore is never closed");

        RateLimitPermit {
            permit: Some(permit),
            cooldown: self.cooldown,
            last_release: Arc::clone(&self.last_release),
        }
    }

    /// Run one protected call: acquire, await `call`, then release after the cool-down.
    pub async fn run<F, Fut, T>(&self, call: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let permit = self.acquire().await;
        let output = call().await;
        permit.release().await;
        output
    }

    /// Slots currently free.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// When a slot was last handed back, if ever.
    pub fn last_release(&self) -> Option<Instant> {
        *self.last_release.lock()
    }
}

// =============================================================================
// RateLimitPermit
// =============================================================================

/// Exclusive right to make one external call.
///
/// Call [`RateLimitPermit::release`] once the call has completed. A permit
/// dropped without release (cancelled task, early return) still waits out the
/// cool-down on a background task before freeing the slot.
pub struct RateLimitPermit {
    permit: Option<OwnedSemaphorePermit>,
    cooldown: Duration,
    last_release: Arc<Mutex<Option<Instant>>>,
}

impl RateLimitPermit {
    /// Wait the cool-down, then free the slot.
    pub async fn release(mut self) {
        if !self.cooldown.is_zero() {
            tokio::time::sleep(self.cooldown).await;
        }
        *self.last_release.lock() = Some(Instant::now());
        self.permit.take();
    }
}

impl Drop for RateLimitPermit {
    fn drop(&mut self) {
        let Some(permit) = self.permit.take() else {
            return;
        };

        let cooldown = self.cooldown;
        let last_release = Arc::clone(&self.last_release);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) if !cooldown.is_zero() => {
                handle.spawn(async move {
                    tokio::time::sleep(cooldown).await;
                    *last_release.lock() = Some(Instant::now());
                    drop(permit);
                });
            }
            _ => {
                *last_release.lock() = Some(Instant::now());
                drop(permit);
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
