//! Vendor API adapters
//!
//! - [`oauth`]: the OAuth token endpoint used by the token manager
//! - [`auth`]: bearer tokens for requests
//! - [`client`]: the [`UplinkApi`](uplinkbridge_core::UplinkApi) implementation

pub mod auth;
pub mod client;
mod errors;
pub mod oauth;

pub use auth::AccessTokenProvider;
pub use client::UplinkClient;
pub use oauth::OAuthEndpoint;
