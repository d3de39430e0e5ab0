//! Reusable infrastructure shared by the bridge crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: clock abstraction
//! - `runtime`: token encryption, reconnect backoff, call pacing
//! - `platform`: token persistence and lifecycle (`auth`)
//! - `test-utils`: in-memory doubles for the `auth` traits

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod time;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod crypto;
#[cfg(feature = "runtime")]
pub mod resilience;

// Platform tier
// -------------------------------------------------------------------
#[cfg(feature = "platform")]
pub mod auth;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", all(test, feature = "platform")))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "platform")]
pub use auth::{FileTokenStore, TokenEndpoint, TokenManager, TokenStore};
#[cfg(feature = "runtime")]
pub use crypto::{CryptoError, EncryptedData, EncryptionService};
#[cfg(feature = "runtime")]
pub use resilience::{Backoff, Pacer};
#[cfg(feature = "foundation")]
pub use time::{Clock, MockClock, SystemClock};
