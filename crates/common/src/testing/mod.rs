//! In-memory doubles for the `auth` traits
//!
//! Shared by this crate's unit tests and by downstream integration tests
//! (enable the `test-utils` feature).

pub mod mocks;

pub use mocks::{MemoryTokenStore, MockTokenEndpoint};
