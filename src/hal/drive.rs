//! Motor drive trait and mock implementation

use std::time::Duration;

/// Motor drive interface.
///
/// Calls that carry a duration block for that long and then stop; calls
/// without one keep driving until the next `stop()`.
pub trait DriveMotor: Send {
    /// Drive forward, optionally for a fixed pulse.
    fn forward(&mut self, duration: Option<Duration>);

    /// Drive backward, optionally for a fixed pulse.
    fn backward(&mut self, duration: Option<Duration>);

    /// Pivot left (counter-clockwise) for `duration`.
    fn turn_left(&mut self, duration: Duration);

    /// Pivot right (clockwise) for `duration`.
    fn turn_right(&mut self, duration: Duration);

    /// Stop all motors.
    fn stop(&mut self);

    /// Set motor power in percent (0-100).
    fn set_speed(&mut self, percent: u8);
}

/// One recorded drive call, durations in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriveCommand {
    Forward(Option<f32>),
    Backward(Option<f32>),
    TurnLeft(f32),
    TurnRight(f32),
    Stop,
    SetSpeed(u8),
}

/// Mock drive that records every command instead of moving motors.
///
/// Pulse calls return immediately rather than sleeping, so tests run at full
/// speed.
#[derive(Debug, Default)]
pub struct MockDrive {
    commands: Vec<DriveCommand>,
    speed_pct: u8,
}

impl MockDrive {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            speed_pct: 0,
        }
    }

    /// All commands received so far, in order.
    pub fn commands(&self) -> &[DriveCommand] {
        &self.commands
    }

    /// Last commanded motor power.
    pub fn speed_pct(&self) -> u8 {
        self.speed_pct
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl DriveMotor for MockDrive {
    fn forward(&mut self, duration: Option<Duration>) {
        self.commands
            .push(DriveCommand::Forward(duration.map(|d| d.as_secs_f32())));
    }

    fn backward(&mut self, duration: Option<Duration>) {
        self.commands
            .push(DriveCommand::Backward(duration.map(|d| d.as_secs_f32())));
    }

    fn turn_left(&mut self, duration: Duration) {
        self.commands
            .push(DriveCommand::TurnLeft(duration.as_secs_f32()));
    }

    fn turn_right(&mut self, duration: Duration) {
        self.commands
            .push(DriveCommand::TurnRight(duration.as_secs_f32()));
    }

    fn stop(&mut self) {
        self.commands.push(DriveCommand::Stop);
    }

    fn set_speed(&mut self, percent: u8) {
        self.speed_pct = percent;
        self.commands.push(DriveCommand::SetSpeed(percent));
    }
}
