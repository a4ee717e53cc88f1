//! SurangNav - Tunnel navigation controller for a small exploration rover
//!
//! Drives a wheeled rover through a bounded linear tunnel and back:
//!
//! - **Orientation**: complementary filter fusing accelerometer and
//!   gyroscope samples into pitch/roll/yaw/incline
//! - **Odometry**: dead-reckoned pose from commanded motion durations and
//!   calibrated speed constants (deliberately not IMU-integrated)
//! - **Navigation**: obstacle-avoidance state machine that logs every
//!   forward action and replays the mirrored log to return to the origin
//! - **Telemetry**: auto-reconnecting link to the sensor pod, decoded
//!   records buffered into SQLite with WAL journaling
//!
//! ```text
//! ranging triple ──▶ Navigator ──▶ DriveMotor
//!                        │
//!                        ▼
//!                  OdometryTracker ──────────────┐ (pose stamp)
//!                                                ▼
//! pod link ──▶ ConnectionSupervisor ──▶ records ──▶ TelemetryBuffer ──▶ SQLite
//! ```
//!
//! The navigator and odometry run on the single main-loop thread; the
//! connection supervisor runs concurrently and shares only the connection
//! state flags and the bounded record channel.

pub mod app;
pub mod config;
pub mod error;
pub mod hal;
pub mod navigation;
pub mod odometry;
pub mod orientation;
pub mod shared;
pub mod telemetry;
pub mod utils;

pub use app::App;
pub use config::RoverConfig;
pub use error::{Result, SurangError};
pub use navigation::{ActionLog, DriveAction, NavMode, Navigator, OperatorCommand};
pub use odometry::{OdometryTracker, Pose};
pub use orientation::{OrientationEstimator, OrientationSample};
pub use shared::ConnectionState;
pub use telemetry::{ConnectionSupervisor, TelemetryBuffer, TelemetryRecord};
