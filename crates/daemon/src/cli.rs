//! Command-line interface
//!
//! `uplink-bridge [CONFIG]` runs the bridge; `uplink-bridge [CONFIG] authorize
//! <CODE> <CALLBACK_URL>` performs the one-time code exchange and exits.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uplinkbridge_infra::config::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML or JSON)
    #[arg(env = CONFIG_PATH_ENV, default_value = DEFAULT_CONFIG_PATH, value_name = "CONFIG")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Clone, Debug, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Exchange an authorization code for a token and exit
    Authorize {
        /// Code returned to the callback URL
        code: String,
        /// Callback URL registered for the client
        callback_url: String,
    },
}

/// Parse the process arguments, exiting with usage on error
pub fn parse() -> Cli {
    Parser::parse()
}
