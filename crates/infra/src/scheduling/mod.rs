//! Polling scheduler and its lifecycle
//!
//! - Explicit lifecycle (`run` until the cancellation token fires)
//! - Per-cycle poll tasks tracked in a join set
//! - Observable state through a watch channel

pub mod error;
pub mod poll_scheduler;
pub mod state;
mod tasks;

pub use error::{SchedulerError, SchedulerResult};
pub use poll_scheduler::{daily_check_due, PollScheduler};
pub use state::SchedulerState;
pub use tasks::CyclePlan;
