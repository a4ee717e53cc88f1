//! Hardware interfaces for the rover chassis.
//!
//! The real GPIO/PWM motor controller and the ultrasonic ranging rig live
//! outside this crate; the navigator talks to them through the traits here.
//! The mock implementations stand in for bench runs and tests.

mod drive;
mod ranging;

pub use drive::{DriveCommand, DriveMotor, MockDrive};
pub use ranging::{MockRanging, RangeTriple, RangingArray, SensorSide};
