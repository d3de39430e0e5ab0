//! OAuth token persistence and lifecycle
//!
//! ```text
//! ┌─────────────────┐
//! │  TokenManager   │  expiry checks, serialized refresh
//! └────────┬────────┘
//!          │
//!          ├──► TokenEndpoint   (HTTP code exchange and refresh grant)
//!          │
//!          └──► TokenStore      (encrypted token file)
//! ```
//!
//! # Module Organization
//!
//! - **[`traits`]**: the `TokenEndpoint` and `TokenStore` seams
//! - **[`file_store`]**: AES-256-GCM encrypted token file, mode 0600
//! - **[`token_manager`]**: load, expiry check, refresh-on-demand, authorize

pub mod file_store;
pub mod token_manager;
pub mod traits;

pub use file_store::FileTokenStore;
pub use token_manager::TokenManager;
pub use traits::{TokenEndpoint, TokenStore};
