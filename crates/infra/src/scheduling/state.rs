//! Scheduler lifecycle states

use uplinkbridge_domain::impl_domain_enum_conversions;

/// Where the scheduler is in its lifecycle
///
/// `Idle → Connecting → Running ⇄ Reloading → ShuttingDown → Stopped`.
/// `Stopped` is terminal for a given `run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulerState {
    Idle,
    Connecting,
    Running,
    Reloading,
    ShuttingDown,
    Stopped,
}

impl_domain_enum_conversions!(SchedulerState {
    Idle => "idle",
    Connecting => "connecting",
    Running => "running",
    Reloading => "reloading",
    ShuttingDown => "shutting_down",
    Stopped => "stopped",
});
