//! UCI protocol handling for talon.

pub mod command;
pub mod engine;
pub mod error;

pub use command::{Command, GoCommand, PositionCommand, parse_command};
pub use engine::{Output, UciEngine};
pub use error::UciError;
