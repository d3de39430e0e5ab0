//! Fixed-spacing gate between outbound calls

use std::time::Duration;

use tokio::time::{sleep_until, Instant};

/// Lets one dispatch through per `spacing`.
///
/// The first [`Pacer::ready`] returns immediately; each later call waits until
/// `spacing` has passed since the previous one was released. Time spent doing
/// other work in between counts toward the spacing.
#[derive(Debug)]
pub struct Pacer {
    spacing: Duration,
    next_slot: Option<Instant>,
}

impl Pacer {
    #[must_use]
    pub fn new(spacing: Duration) -> Self {
        Self { spacing, next_slot: None }
    }

    #[must_use]
    pub fn spacing(&self) -> Duration {
        self.spacing
    }

    /// Wait for the next slot
    pub async fn ready(&mut self) {
        if let Some(slot) = self.next_slot {
            sleep_until(slot).await;
        }
        self.next_slot = Some(Instant::now() + self.spacing);
    }
}
