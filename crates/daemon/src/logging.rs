//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

/// Crates whose chatter stays at warn unless `RUST_LOG` says otherwise
const QUIET_TARGETS: &[&str] = &["rumqttc", "hyper", "reqwest"];

/// `RUST_LOG` wins; otherwise the configured level for our crates
pub fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback_filter(level))
}

fn fallback_filter(level: &str) -> EnvFilter {
    let directives = std::iter::once(level.to_ascii_lowercase())
        .chain(QUIET_TARGETS.iter().map(|target| format!("{target}=warn")))
        .collect::<Vec<_>>()
        .join(",");
    EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber
pub fn init(level: &str) {
    tracing_subscriber::fmt().with_env_filter(filter(level)).with_target(false).init();
}
