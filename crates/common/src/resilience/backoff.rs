//! Exponential backoff as an explicit state object
//!
//! The caller owns a `Backoff` and drives its own retry loop:
//!
//! ```rust
//! # async fn connect() -> Result<(), ()> { Ok(()) }
//! # async fn run() {
//! use std::time::Duration;
//! use uplinkbridge_common::resilience::Backoff;
//!
//! let mut backoff = Backoff::new(Duration::from_secs(1), Duration::from_secs(60));
//! while connect().await.is_err() {
//!     backoff.wait().await;
//! }
//! backoff.reset();
//! # }
//! ```

use std::time::Duration;

use tracing::debug;

/// Doubling delay, capped, with no retry budget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    attempt: u32,
}

impl Backoff {
    #[must_use]
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self { initial, max: max.max(initial), attempt: 0 }
    }

    /// Number of delays handed out since the last reset
    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Delay the next call to [`Backoff::next_delay`] will return
    #[must_use]
    pub fn peek(&self) -> Duration {
        // 2^attempt, saturating well before overflow
        let factor = 1u32.checked_shl(self.attempt.min(31)).unwrap_or(u32::MAX);
        self.initial.saturating_mul(factor).min(self.max)
    }

    /// Return the current delay and advance the state
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.peek();
        self.attempt = self.attempt.saturating_add(1);
        delay
    }

    /// Sleep for the next delay
    pub async fn wait(&mut self) -> Duration {
        let delay = self.next_delay();
        debug!(attempt = self.attempt, delay_secs = delay.as_secs_f64(), "Backing off");
        tokio::time::sleep(delay).await;
        delay
    }

    /// Back to the initial delay after a success
    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}
