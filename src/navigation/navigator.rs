//! Obstacle-avoidance decision engine and forward/reverse trip state machine.
//!
//! The navigator owns the odometry tracker: every commanded motion goes
//! through a helper that drives the motors and mirrors the motion into the
//! tracker, so pose bookkeeping can never be bypassed.
//!
//! ## Trip state machine
//!
//! ```text
//! Manual ──toggle──▶ ForwardAuto ──tunnel end──▶ ReverseAuto ──log empty──▶ Manual
//!    ▲                    │                           │
//!    └──────toggle────────┴───────────toggle──────────┘
//! ```
//!
//! The forward trip records every action; at the tunnel end the log is
//! mirrored (order reversed, turns swapped) and replayed, backing down each
//! forward leg. The replay does not re-read the ranging sensors: it trusts
//! that the forward path is still clear.

use super::actions::{ActionLog, DriveAction};
use crate::config::{DriveConfig, NavigationConfig};
use crate::hal::{DriveMotor, RangingArray, SensorSide};
use crate::odometry::OdometryTracker;
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

/// Control mode of the trip state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavMode {
    /// Operator commands drive the rover directly
    Manual,
    /// Autonomous outbound trip with obstacle avoidance and action logging
    ForwardAuto,
    /// Mirrored replay of the forward trip, back to the origin
    ReverseAuto,
}

impl fmt::Display for NavMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NavMode::Manual => "MANUAL",
            NavMode::ForwardAuto => "FORWARD",
            NavMode::ReverseAuto => "REVERSE",
        };
        f.write_str(label)
    }
}

/// Single-key operator commands from the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    Forward,
    Backward,
    TurnLeft,
    TurnRight,
    Stop,
    SetOrigin,
    ToggleMode,
    Quit,
}

impl OperatorCommand {
    /// Map a control-surface key to a command.
    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'w' => Some(OperatorCommand::Forward),
            's' => Some(OperatorCommand::Backward),
            'a' => Some(OperatorCommand::TurnLeft),
            'd' => Some(OperatorCommand::TurnRight),
            ' ' => Some(OperatorCommand::Stop),
            'p' => Some(OperatorCommand::SetOrigin),
            'c' => Some(OperatorCommand::ToggleMode),
            'q' => Some(OperatorCommand::Quit),
            _ => None,
        }
    }
}

/// Autonomous navigator with obstacle avoidance and path replay.
pub struct Navigator<D: DriveMotor, R: RangingArray> {
    drive: D,
    ranging: R,
    odometry: OdometryTracker,
    drive_cfg: DriveConfig,
    nav_cfg: NavigationConfig,
    mode: NavMode,
    log: ActionLog,
    replay: VecDeque<DriveAction>,
}

impl<D: DriveMotor, R: RangingArray> Navigator<D, R> {
    pub fn new(
        drive: D,
        ranging: R,
        odometry: OdometryTracker,
        drive_cfg: DriveConfig,
        nav_cfg: NavigationConfig,
    ) -> Self {
        Self {
            drive,
            ranging,
            odometry,
            drive_cfg,
            nav_cfg,
            mode: NavMode::Manual,
            log: ActionLog::new(),
            replay: VecDeque::new(),
        }
    }

    pub fn mode(&self) -> NavMode {
        self.mode
    }

    pub fn odometry(&self) -> &OdometryTracker {
        &self.odometry
    }

    pub fn action_log(&self) -> &ActionLog {
        &self.log
    }

    /// Remaining return-trip entries.
    pub fn replay_remaining(&self) -> usize {
        self.replay.len()
    }

    pub fn drive(&self) -> &D {
        &self.drive
    }

    pub fn drive_mut(&mut self) -> &mut D {
        &mut self.drive
    }

    pub fn ranging_mut(&mut self) -> &mut R {
        &mut self.ranging
    }

    /// Snapshot the current position as the trip origin.
    pub fn set_origin(&mut self) {
        self.odometry.set_origin();
    }

    /// Operator toggle between manual and autonomous control.
    ///
    /// Entering autonomous mode starts a fresh action log; leaving it stops
    /// the drive immediately and abandons any pending replay.
    pub fn toggle_mode(&mut self) {
        match self.mode {
            NavMode::Manual => {
                self.log.clear();
                self.replay.clear();
                self.drive.set_speed(self.drive_cfg.cruise_speed_pct);
                self.mode = NavMode::ForwardAuto;
                log::info!("Control mode: AUTOMATIC");
            }
            NavMode::ForwardAuto | NavMode::ReverseAuto => {
                self.drive.stop();
                self.replay.clear();
                self.mode = NavMode::Manual;
                log::info!("Control mode: MANUAL");
            }
        }
    }

    /// Apply one manual-mode operator command as a single drive pulse plus
    /// the matching odometry update. No logging happens in manual mode.
    pub fn apply_manual(&mut self, command: OperatorCommand) {
        if self.mode != NavMode::Manual {
            return;
        }
        let pulse = self.drive_cfg.manual_pulse_secs;
        let pulse_duration = Duration::from_secs_f32(pulse);
        match command {
            OperatorCommand::Forward => {
                self.drive.forward(Some(pulse_duration));
                self.odometry.update_forward(pulse);
            }
            OperatorCommand::Backward => {
                self.drive.backward(Some(pulse_duration));
                self.odometry.update_backward(pulse);
            }
            OperatorCommand::TurnLeft => {
                self.drive.turn_left(pulse_duration);
                self.odometry.update_turn_left(pulse);
            }
            OperatorCommand::TurnRight => {
                self.drive.turn_right(pulse_duration);
                self.odometry.update_turn_right(pulse);
            }
            OperatorCommand::Stop => self.drive.stop(),
            OperatorCommand::SetOrigin
            | OperatorCommand::ToggleMode
            | OperatorCommand::Quit => {}
        }
    }

    /// Execute one navigation cycle.
    pub fn navigate_step(&mut self) {
        match self.mode {
            NavMode::Manual => {}
            NavMode::ForwardAuto => self.forward_step(),
            NavMode::ReverseAuto => self.replay_step(),
        }
    }

    /// Stop the drive immediately, whatever the mode.
    pub fn stop_drive(&mut self) {
        self.drive.stop();
    }

    /// One outbound cycle: distance limit check, then the avoidance ladder.
    fn forward_step(&mut self) {
        if self.check_tunnel_end() {
            return;
        }

        let reading = self.ranging.read(SensorSide::Front);
        let threshold = self.nav_cfg.obstacle_threshold_cm;

        if reading.center < threshold {
            // Blocked ahead: stop, then turn toward the side with more
            // clearance. Infinite (timed-out) readings count as clearance.
            self.drive.stop();
            pause(self.nav_cfg.avoid_pause_secs);

            let duration = self.nav_cfg.avoid_turn_secs;
            if reading.left > reading.right {
                log::info!(
                    "Obstacle ahead, turning LEFT (L:{:.1} R:{:.1})",
                    reading.left,
                    reading.right
                );
                self.turn_left_logged(duration);
            } else {
                log::info!(
                    "Obstacle ahead, turning RIGHT (L:{:.1} R:{:.1})",
                    reading.left,
                    reading.right
                );
                self.turn_right_logged(duration);
            }
        } else if reading.left < threshold {
            log::info!("Obstacle on left ({:.1}cm), adjusting RIGHT", reading.left);
            self.drive.set_speed(self.drive_cfg.corrective_speed_pct);
            self.turn_right_logged(self.nav_cfg.corrective_turn_secs);
            self.drive.set_speed(self.drive_cfg.cruise_speed_pct);
        } else if reading.right < threshold {
            log::info!("Obstacle on right ({:.1}cm), adjusting LEFT", reading.right);
            self.drive.set_speed(self.drive_cfg.corrective_speed_pct);
            self.turn_left_logged(self.nav_cfg.corrective_turn_secs);
            self.drive.set_speed(self.drive_cfg.cruise_speed_pct);
        } else {
            // Clear: one forward pulse, tracked and logged
            let duration = self.nav_cfg.cycle_drive_secs;
            self.drive.forward(Some(Duration::from_secs_f32(duration)));
            self.odometry.update_forward(duration);
            self.log.push(DriveAction::Forward { duration });
        }
    }

    /// Tunnel-end transition: build the mirrored replay and switch modes.
    fn check_tunnel_end(&mut self) -> bool {
        let dist = self.odometry.distance_from_start();
        if dist < self.nav_cfg.tunnel_length {
            return false;
        }

        log::info!(
            "Reached tunnel end ({:.2}m), replaying {} actions back to origin",
            dist,
            self.log.len()
        );
        self.replay = self.log.build_inverse().into();
        self.drive.stop();
        pause(self.nav_cfg.stop_pause_secs);
        self.mode = NavMode::ReverseAuto;
        true
    }

    /// Execute the next return-trip entry with its original duration.
    ///
    /// The rover never turns around: a forward leg is retraced by backing
    /// down it, and the pre-swapped turns unwind the heading between legs.
    /// No ranging read happens here: the replay assumes the path it took is
    /// still clear.
    fn replay_step(&mut self) {
        if let Some(action) = self.replay.pop_front() {
            match action {
                DriveAction::Forward { duration } => {
                    log::debug!("Returning: backing {:.2}s", duration);
                    self.drive.backward(Some(Duration::from_secs_f32(duration)));
                    self.odometry.update_backward(duration);
                }
                DriveAction::TurnLeft { duration } => {
                    log::debug!("Returning: turn left {:.2}s", duration);
                    self.drive.turn_left(Duration::from_secs_f32(duration));
                    self.odometry.update_turn_left(duration);
                }
                DriveAction::TurnRight { duration } => {
                    log::debug!("Returning: turn right {:.2}s", duration);
                    self.drive.turn_right(Duration::from_secs_f32(duration));
                    self.odometry.update_turn_right(duration);
                }
            }
        }

        if self.replay.is_empty() {
            self.drive.stop();
            self.mode = NavMode::Manual;
            log::info!("Reached origin, control returned to MANUAL");
        }
    }

    fn turn_left_logged(&mut self, duration: f32) {
        self.drive.turn_left(Duration::from_secs_f32(duration));
        self.odometry.update_turn_left(duration);
        if self.mode == NavMode::ForwardAuto {
            self.log.push(DriveAction::TurnLeft { duration });
        }
    }

    fn turn_right_logged(&mut self, duration: f32) {
        self.drive.turn_right(Duration::from_secs_f32(duration));
        self.odometry.update_turn_right(duration);
        if self.mode == NavMode::ForwardAuto {
            self.log.push(DriveAction::TurnRight { duration });
        }
    }
}

fn pause(secs: f32) {
    if secs > 0.0 {
        std::thread::sleep(Duration::from_secs_f32(secs));
    }
}
