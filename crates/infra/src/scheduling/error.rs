//! Scheduler error types

use thiserror::Error;
use uplinkbridge_domain::{BusError, ConfigError};

/// Scheduler-specific errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// `run` was called while another `run` is active
    #[error("Scheduler already running")]
    AlreadyRunning,

    /// The message bus could not be brought up
    #[error("Message bus error: {0}")]
    Bus(#[from] BusError),

    /// The configuration cannot be turned into a polling plan
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A spawned task panicked or was aborted
    #[error("Task join failed: {0}")]
    TaskJoin(String),
}

impl From<tokio::task::JoinError> for SchedulerError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::TaskJoin(err.to_string())
    }
}

/// Convenience type alias for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
