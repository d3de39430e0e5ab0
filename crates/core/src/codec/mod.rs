//! Telemetry codec
//!
//! Pure, deterministic transforms between the vendor API's JSON and the
//! values published on the bus, plus parsing of inbound command messages.
//! Nothing in here performs I/O or logs.

pub mod batching;
pub mod command;
pub mod readings;
pub mod software;
pub mod status;
pub mod system;
pub mod topics;

pub use batching::split_into_batches;
pub use command::parse_inbound_command;
pub use readings::{parse_readings, ScaleTable};
pub use software::{parse_software, SoftwareStatus};
pub use status::{normalize_key, parse_status, SubsystemStatus, SUBSYSTEMS};
pub use system::{normalize_activity_date, parse_system_summary, SystemSummary};
pub use topics::Topics;
