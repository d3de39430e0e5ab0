//! Configuration loading and hot reload

pub mod loader;
pub mod watcher;

pub use loader::{load_from_file, parse_config, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
pub use watcher::ConfigHandle;
