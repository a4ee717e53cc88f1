//! Dead-reckoned odometry from commanded motion durations.
//!
//! Position is tracked as calibrated speed × commanded duration projected
//! onto the current heading. This is deliberately not derived from IMU
//! integration: double-integrated accelerometer displacement drifted too much
//! to be usable, so the tracker trades agility compensation for bounded,
//! predictable error growth from the calibration constants.

use crate::config::DriveConfig;
use crate::utils::wrap_degrees;

/// 2D pose in meters and degrees.
///
/// `heading_deg` is always wrapped into [0, 360); 0° points down the tunnel
/// axis, angles grow counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    pub heading_deg: f32,
}

impl Pose {
    /// Heading in radians, for telemetry stamping.
    pub fn heading_rad(&self) -> f32 {
        self.heading_deg.to_radians()
    }
}

/// Dead-reckoning position tracker.
///
/// The pose is updated only through the four motion mutators; the tracker has
/// no independent sensing, so every commanded motion must be mirrored here.
#[derive(Debug)]
pub struct OdometryTracker {
    /// Calibrated forward speed in m/s
    wheel_speed: f32,
    /// Calibrated turn rate in deg/s
    turn_rate: f32,
    pose: Pose,
    /// Origin snapshot for distance_from_start
    start_x: f32,
    start_y: f32,
}

impl OdometryTracker {
    pub fn new(config: &DriveConfig) -> Self {
        Self {
            wheel_speed: config.wheel_speed,
            turn_rate: config.turn_rate,
            pose: Pose::default(),
            start_x: 0.0,
            start_y: 0.0,
        }
    }

    /// Snapshot the current position as the trip origin.
    pub fn set_origin(&mut self) {
        self.start_x = self.pose.x;
        self.start_y = self.pose.y;
        log::info!(
            "Origin set at ({:.2}, {:.2})",
            self.pose.x,
            self.pose.y
        );
    }

    /// Apply a forward pulse of `duration` seconds.
    pub fn update_forward(&mut self, duration: f32) {
        let distance = self.wheel_speed * duration;
        let rad = self.pose.heading_deg.to_radians();
        self.pose.x += distance * rad.cos();
        self.pose.y += distance * rad.sin();
    }

    /// Apply a backward pulse of `duration` seconds.
    pub fn update_backward(&mut self, duration: f32) {
        let distance = self.wheel_speed * duration;
        let rad = self.pose.heading_deg.to_radians();
        self.pose.x -= distance * rad.cos();
        self.pose.y -= distance * rad.sin();
    }

    /// Apply a left (counter-clockwise) turn of `duration` seconds.
    pub fn update_turn_left(&mut self, duration: f32) {
        self.pose.heading_deg = wrap_degrees(self.pose.heading_deg + self.turn_rate * duration);
    }

    /// Apply a right (clockwise) turn of `duration` seconds.
    pub fn update_turn_right(&mut self, duration: f32) {
        self.pose.heading_deg = wrap_degrees(self.pose.heading_deg - self.turn_rate * duration);
    }

    /// Straight-line distance from the origin snapshot.
    pub fn distance_from_start(&self) -> f32 {
        let dx = self.pose.x - self.start_x;
        let dy = self.pose.y - self.start_y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Get the current pose.
    pub fn pose(&self) -> Pose {
        self.pose
    }
}
