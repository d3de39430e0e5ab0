//! Resilience patterns for a long-running bridge
//!
//! - **[`Backoff`]**: explicit exponential reconnect state (attempt counter and
//!   next delay), reset on success, never gives up
//! - **[`Pacer`]**: fixed-spacing gate awaited before each outbound API call to
//!   stay inside the vendor's rate limits

pub mod backoff;
pub mod pacer;

pub use backoff::Backoff;
pub use pacer::Pacer;
