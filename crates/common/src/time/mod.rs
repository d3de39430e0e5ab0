//! Time abstractions
//!
//! Token expiry is judged against wall-clock time, so the clock here yields
//! `DateTime<Utc>` rather than a monotonic instant. Tests swap in
//! [`MockClock`] to move time without sleeping.

pub mod clock;

pub use clock::{Clock, MockClock, SystemClock};
