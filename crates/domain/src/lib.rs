//! # Uplink Bridge Domain
//!
//! Domain types shared by every crate in the bridge.
//!
//! This crate contains:
//! - The data model (tokens, parameter batches, readings, commands)
//! - Error types and their classification
//! - Configuration structures
//! - Protocol constants (topics, page sizes, pacing)
//!
//! ## Architecture
//! - No dependencies on other bridge crates
//! - No I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
