//! Data model of the bridge

pub mod batch;
pub mod command;
pub mod reading;
pub mod token;

pub use batch::{ParameterBatch, ParameterId};
pub use command::{Command, CommandFamily};
pub use reading::{ReadingValue, Readings, Switch};
pub use token::{Token, TokenResponse};
