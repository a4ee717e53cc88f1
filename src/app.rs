//! Control-loop orchestration.
//!
//! One cooperative loop drives navigation on a fixed cadence, drains the
//! inbound record queue, paces buffer flushes, and emits the status line.
//! On every exit path the shutdown order is: stop the drive motors, flush
//! the telemetry buffer, then (in `main`) tear down the connection.

use crate::config::RoverConfig;
use crate::hal::{DriveMotor, RangingArray};
use crate::navigation::{Navigator, OperatorCommand};
use crate::orientation::OrientationEstimator;
use crate::shared::ConnectionState;
use crate::telemetry::{RecordStore, TelemetryBuffer, TelemetryRecord};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main-loop poll slice; navigation and flushes run on their own cadences
/// on top of this.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// The assembled rover controller.
pub struct App<D: DriveMotor, R: RangingArray, S: RecordStore> {
    config: RoverConfig,
    navigator: Navigator<D, R>,
    orientation: OrientationEstimator,
    buffer: TelemetryBuffer<S>,
    conn_state: Arc<ConnectionState>,
    records: Receiver<TelemetryRecord>,
    commands: Receiver<OperatorCommand>,
    shutdown: Arc<AtomicBool>,
}

impl<D: DriveMotor, R: RangingArray, S: RecordStore> App<D, R, S> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: RoverConfig,
        navigator: Navigator<D, R>,
        orientation: OrientationEstimator,
        buffer: TelemetryBuffer<S>,
        conn_state: Arc<ConnectionState>,
        records: Receiver<TelemetryRecord>,
        commands: Receiver<OperatorCommand>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            config,
            navigator,
            orientation,
            buffer,
            conn_state,
            records,
            commands,
            shutdown,
        }
    }

    /// Run until the shutdown flag is set, then stop motors and flush.
    pub fn run(&mut self) {
        let nav_interval = Duration::from_secs_f32(self.config.navigation.nav_interval_secs);
        let flush_interval = Duration::from_secs_f32(self.config.storage.flush_interval_secs);
        let status_interval = Duration::from_secs_f32(self.config.navigation.status_interval_secs);

        let mut last_nav = Instant::now();
        let mut last_flush = Instant::now();
        let mut last_status = Instant::now();

        log::info!("Control loop running");

        while !self.shutdown.load(Ordering::Acquire) {
            // Operator commands are polled non-blockingly each cycle
            while let Ok(command) = self.commands.try_recv() {
                self.apply_command(command);
            }

            if last_nav.elapsed() >= nav_interval {
                self.navigator.navigate_step();
                last_nav = Instant::now();
            }

            // Drain decoded records; the supervisor only ever enqueues
            while let Ok(record) = self.records.try_recv() {
                self.ingest(record);
            }

            if self.buffer.should_flush() || last_flush.elapsed() >= flush_interval {
                if self.buffer.flush() > 0 {
                    last_flush = Instant::now();
                }
            }

            if last_status.elapsed() >= status_interval {
                self.log_status();
                last_status = Instant::now();
            }

            std::thread::sleep(POLL_INTERVAL);
        }

        // Motors first, then the buffer; main tears down the link after us
        log::info!("Shutting down...");
        self.navigator.stop_drive();
        let flushed = self.buffer.flush();
        log::info!("Final flush: {} records written", flushed);

        let stats = self.buffer.stats();
        log::info!(
            "Session totals: {} logged, {} flushed, {} still buffered",
            stats.total_logged,
            stats.total_flushed,
            stats.buffered
        );
        log::info!("Reconnections: {}", self.conn_state.reconnect_count().saturating_sub(1));
    }

    fn apply_command(&mut self, command: OperatorCommand) {
        match command {
            OperatorCommand::Quit => {
                log::info!("Operator requested shutdown");
                self.shutdown.store(true, Ordering::Release);
            }
            OperatorCommand::SetOrigin => self.navigator.set_origin(),
            OperatorCommand::ToggleMode => self.navigator.toggle_mode(),
            motion => self.navigator.apply_manual(motion),
        }
    }

    /// Fuse the record's IMU sample and stamp it with the dead-reckoned pose
    /// before buffering. Persisted rows are in the navigator's frame,
    /// whatever position estimate the pod sent.
    fn ingest(&mut self, mut record: TelemetryRecord) {
        if let Some([ax, ay, az, gx, gy, gz]) = record.imu() {
            self.orientation.update(ax, ay, az, gx, gy, gz, Instant::now());
        }

        let pose = self.navigator.odometry().pose();
        record.pos_x = Some(pose.x as f64);
        record.pos_y = Some(pose.y as f64);
        record.yaw = Some(pose.heading_rad() as f64);
        self.buffer.add(record);
    }

    fn log_status(&self) {
        let pose = self.navigator.odometry().pose();
        let orient = self.orientation.sample();
        let stats = self.buffer.stats();

        let link = if self.conn_state.is_connected() {
            "connected"
        } else {
            "disconnected"
        };
        let last_data = match self.conn_state.secs_since_last_data() {
            Some(secs) => format!("{:.1}s ago", secs),
            None => "never".to_string(),
        };

        log::info!(
            "[{}] pos=({:.2}, {:.2}) heading={:.1}° dist={:.2}m incline={:.2}rad | {} (last data {}) | logged {} flushed {} buffered {}",
            self.navigator.mode(),
            pose.x,
            pose.y,
            pose.heading_deg,
            self.navigator.odometry().distance_from_start(),
            orient.incline,
            link,
            last_data,
            stats.total_logged,
            stats.total_flushed,
            stats.buffered
        );
    }
}
