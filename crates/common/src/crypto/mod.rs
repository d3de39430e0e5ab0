//! Shared cryptographic primitives used by token persistence.

pub mod encryption;

pub use encryption::{CryptoError, EncryptedData, EncryptionService};
