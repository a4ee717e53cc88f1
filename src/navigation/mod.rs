//! Trip state machine and obstacle avoidance.

mod actions;
mod navigator;

pub use actions::{ActionLog, DriveAction};
pub use navigator::{NavMode, Navigator, OperatorCommand};
