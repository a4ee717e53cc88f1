//! Configuration loading for SurangNav
//!
//! All calibration state (wheel speed, turn rate, filter alpha) lives here as
//! an immutable configuration tree passed into each component at construction.

use crate::error::{Result, SurangError};
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Clone, Debug, Deserialize)]
pub struct RoverConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub drive: DriveConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Telemetry link settings
#[derive(Clone, Debug, Deserialize)]
pub struct ConnectionConfig {
    /// Sensor pod address (default: 127.0.0.1:9300)
    #[serde(default = "default_address")]
    pub address: String,

    /// Per-attempt connection timeout in seconds (default: 10.0)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: f32,

    /// Delay between reconnection attempts in seconds (default: 5.0)
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: f32,

    /// Maximum connection attempts, 0 = unlimited (default: 0)
    #[serde(default)]
    pub max_attempts: u32,

    /// Liveness check interval in seconds (default: 10.0)
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: f32,

    /// Seconds without inbound data before the link is declared lost (default: 30.0)
    #[serde(default = "default_data_timeout")]
    pub data_timeout_secs: f32,

    /// How long to wait for the pod's ready acknowledgment (default: 2.0)
    #[serde(default = "default_handshake_wait")]
    pub handshake_wait_secs: f32,
}

/// Drive calibration parameters.
///
/// `wheel_speed` and `turn_rate` are the output of the wheel calibration
/// procedure; odometry is dead-reckoned from these, not from the IMU.
#[derive(Clone, Debug, Deserialize)]
pub struct DriveConfig {
    /// Forward speed at cruise power in m/s (default: 0.15)
    #[serde(default = "default_wheel_speed")]
    pub wheel_speed: f32,

    /// Turn rate at cruise power in deg/s (default: 90.0)
    #[serde(default = "default_turn_rate")]
    pub turn_rate: f32,

    /// Cruise motor power in percent (default: 75)
    #[serde(default = "default_cruise_speed")]
    pub cruise_speed_pct: u8,

    /// Reduced motor power for corrective turns in percent (default: 60)
    #[serde(default = "default_corrective_speed")]
    pub corrective_speed_pct: u8,

    /// Duration of one manual-mode drive pulse in seconds (default: 0.1)
    #[serde(default = "default_manual_pulse")]
    pub manual_pulse_secs: f32,
}

/// Tunnel navigation parameters
#[derive(Clone, Debug, Deserialize)]
pub struct NavigationConfig {
    /// Maximum forward distance before turning back, in meters (default: 10.0)
    #[serde(default = "default_tunnel_length")]
    pub tunnel_length: f32,

    /// Obstacle detection threshold in centimeters (default: 15.0)
    #[serde(default = "default_obstacle_threshold")]
    pub obstacle_threshold_cm: f32,

    /// Turn duration when avoiding a center obstacle, seconds (default: 0.4)
    #[serde(default = "default_avoid_turn")]
    pub avoid_turn_secs: f32,

    /// Turn duration for a side correction, seconds (default: 0.2)
    #[serde(default = "default_corrective_turn")]
    pub corrective_turn_secs: f32,

    /// Forward pulse per clear navigation cycle, seconds (default: 0.2)
    #[serde(default = "default_cycle_drive")]
    pub cycle_drive_secs: f32,

    /// Pause after stopping at the tunnel end, seconds (default: 0.5)
    #[serde(default = "default_stop_pause")]
    pub stop_pause_secs: f32,

    /// Pause after stopping for a center obstacle, seconds (default: 0.1)
    #[serde(default = "default_avoid_pause")]
    pub avoid_pause_secs: f32,

    /// Interval between navigation cycles, seconds (default: 0.1)
    #[serde(default = "default_nav_interval")]
    pub nav_interval_secs: f32,

    /// Interval between status lines, seconds (default: 5.0)
    #[serde(default = "default_status_interval")]
    pub status_interval_secs: f32,
}

/// Orientation filter parameters
#[derive(Clone, Debug, Deserialize)]
pub struct FilterConfig {
    /// Gyroscope weight (0.0 to 1.0).
    ///
    /// Higher values trust the gyroscope more; 0.98 is the tuned default.
    #[serde(default = "default_alpha")]
    pub alpha: f32,

    /// Substitute time step when the clock jumps or on the first update (default: 0.02)
    #[serde(default = "default_nominal_dt")]
    pub nominal_dt_secs: f32,

    /// Longest credible gap between updates; larger gaps use the nominal dt (default: 1.0)
    #[serde(default = "default_max_dt")]
    pub max_dt_secs: f32,
}

/// Telemetry persistence settings
#[derive(Clone, Debug, Deserialize)]
pub struct StorageConfig {
    /// SQLite database path (default: rover_data.db)
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Flush once this many records are buffered (default: 50)
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Also flush on this interval regardless of size, seconds (default: 10.0)
    #[serde(default = "default_flush_interval")]
    pub flush_interval_secs: f32,
}

// Default value functions
fn default_address() -> String {
    "127.0.0.1:9300".to_string()
}
fn default_connect_timeout() -> f32 {
    10.0
}
fn default_retry_delay() -> f32 {
    5.0
}
fn default_check_interval() -> f32 {
    10.0
}
fn default_data_timeout() -> f32 {
    30.0
}
fn default_handshake_wait() -> f32 {
    2.0
}
fn default_wheel_speed() -> f32 {
    0.15
}
fn default_turn_rate() -> f32 {
    90.0
}
fn default_cruise_speed() -> u8 {
    75
}
fn default_corrective_speed() -> u8 {
    60
}
fn default_manual_pulse() -> f32 {
    0.1
}
fn default_tunnel_length() -> f32 {
    10.0
}
fn default_obstacle_threshold() -> f32 {
    15.0
}
fn default_avoid_turn() -> f32 {
    0.4
}
fn default_corrective_turn() -> f32 {
    0.2
}
fn default_cycle_drive() -> f32 {
    0.2
}
fn default_stop_pause() -> f32 {
    0.5
}
fn default_avoid_pause() -> f32 {
    0.1
}
fn default_nav_interval() -> f32 {
    0.1
}
fn default_status_interval() -> f32 {
    5.0
}
fn default_alpha() -> f32 {
    0.98
}
fn default_nominal_dt() -> f32 {
    0.02
}
fn default_max_dt() -> f32 {
    1.0
}
fn default_db_path() -> String {
    "rover_data.db".to_string()
}
fn default_buffer_size() -> usize {
    50
}
fn default_flush_interval() -> f32 {
    10.0
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            connect_timeout_secs: default_connect_timeout(),
            retry_delay_secs: default_retry_delay(),
            max_attempts: 0,
            check_interval_secs: default_check_interval(),
            data_timeout_secs: default_data_timeout(),
            handshake_wait_secs: default_handshake_wait(),
        }
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            wheel_speed: default_wheel_speed(),
            turn_rate: default_turn_rate(),
            cruise_speed_pct: default_cruise_speed(),
            corrective_speed_pct: default_corrective_speed(),
            manual_pulse_secs: default_manual_pulse(),
        }
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            tunnel_length: default_tunnel_length(),
            obstacle_threshold_cm: default_obstacle_threshold(),
            avoid_turn_secs: default_avoid_turn(),
            corrective_turn_secs: default_corrective_turn(),
            cycle_drive_secs: default_cycle_drive(),
            stop_pause_secs: default_stop_pause(),
            avoid_pause_secs: default_avoid_pause(),
            nav_interval_secs: default_nav_interval(),
            status_interval_secs: default_status_interval(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            nominal_dt_secs: default_nominal_dt(),
            max_dt_secs: default_max_dt(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            buffer_size: default_buffer_size(),
            flush_interval_secs: default_flush_interval(),
        }
    }
}

impl Default for RoverConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            drive: DriveConfig::default(),
            navigation: NavigationConfig::default(),
            filter: FilterConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl RoverConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SurangError::Config(format!("Failed to read config file: {}", e)))?;
        let config: RoverConfig = toml::from_str(&content)?;
        Ok(config)
    }
}
