//! Connection supervision: retry, handshake, liveness monitoring.
//!
//! The supervisor owns the transport and runs on its own thread. It talks to
//! the main loop only through [`ConnectionState`] and the bounded record
//! channel; it never touches navigation state. All waits are deadline loops
//! in short slices so a stop request takes effect at the next wake-up.

use crate::config::ConnectionConfig;
use crate::error::Result;
use crate::shared::ConnectionState;
use crate::telemetry::record::TelemetryRecord;
use crate::telemetry::transport::TelemetryTransport;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{SyncSender, TrySendError};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Poll slice for inbound lines and interruptible waits.
const POLL_SLICE: Duration = Duration::from_millis(100);

/// Handle for stopping a supervisor from another thread.
#[derive(Clone)]
pub struct SupervisorHandle {
    stop: Arc<AtomicBool>,
}

impl SupervisorHandle {
    /// Request shutdown; the supervisor observes it at its next wake-up.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }
}

/// Maintains the telemetry link and pumps decoded records to the main loop.
pub struct ConnectionSupervisor<T: TelemetryTransport> {
    transport: T,
    config: ConnectionConfig,
    state: Arc<ConnectionState>,
    records: SyncSender<TelemetryRecord>,
    stop: Arc<AtomicBool>,
}

impl<T: TelemetryTransport> ConnectionSupervisor<T> {
    pub fn new(
        transport: T,
        config: ConnectionConfig,
        state: Arc<ConnectionState>,
        records: SyncSender<TelemetryRecord>,
    ) -> Self {
        Self {
            transport,
            config,
            state,
            records,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn handle(&self) -> SupervisorHandle {
        SupervisorHandle {
            stop: Arc::clone(&self.stop),
        }
    }

    /// Request shutdown.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Connect, handshake, then monitor until stopped. Always leaves the
    /// link torn down.
    pub fn run(&mut self) {
        if self.connect_with_retry() {
            self.monitor_connection();
        }
        self.state.mark_disconnected();
        self.transport.disconnect();
        log::info!("Connection supervisor stopped");
    }

    /// Attempt to connect until it succeeds, the attempt cap is reached, or
    /// a stop is requested. Returns whether the link came up.
    pub fn connect_with_retry(&mut self) -> bool {
        let mut attempt: u32 = 0;
        let timeout = Duration::from_secs_f32(self.config.connect_timeout_secs);
        let backoff = Duration::from_secs_f32(self.config.retry_delay_secs);

        while !self.stopped() {
            if self.config.max_attempts > 0 && attempt >= self.config.max_attempts {
                log::error!("Giving up after {} connection attempts", attempt);
                return false;
            }
            attempt += 1;

            if attempt > 1 {
                if self.config.max_attempts > 0 {
                    log::info!(
                        "Connection attempt {}/{}",
                        attempt,
                        self.config.max_attempts
                    );
                } else {
                    log::info!("Connection attempt {}", attempt);
                }
            }

            match self.transport.connect(timeout) {
                Ok(()) => {
                    self.state.mark_connected();
                    log::info!("Connected to sensor pod");
                    self.handshake();
                    return true;
                }
                Err(e) => {
                    log::warn!(
                        "Connection failed: {} (retrying in {:.0}s)",
                        e,
                        self.config.retry_delay_secs
                    );
                    if !self.wait(backoff) {
                        return false;
                    }
                }
            }
        }
        false
    }

    /// Send the start signal and wait briefly for the pod's acknowledgment.
    /// A missing ack is logged but does not fail the connection.
    fn handshake(&mut self) {
        if let Err(e) = self.transport.send_line("Start") {
            log::warn!("Failed to send start signal: {}", e);
            return;
        }

        let deadline = Instant::now() + Duration::from_secs_f32(self.config.handshake_wait_secs);
        while Instant::now() < deadline && !self.stopped() {
            match self.transport.recv_line(POLL_SLICE) {
                Ok(Some(line)) => {
                    self.state.touch_data();
                    if line.trim().eq_ignore_ascii_case("ready") {
                        log::info!("Sensor pod ready");
                        return;
                    }
                    // Data can start flowing before the ack
                    self.handle_line(&line);
                }
                Ok(None) => {}
                Err(_) => break,
            }
        }
        log::warn!("No ready acknowledgment from sensor pod");
    }

    /// Pump inbound lines and watch liveness until stopped.
    ///
    /// If no data has arrived within the liveness timeout the link is
    /// declared lost, torn down, and re-established with the same retry
    /// policy. Exits if a bounded retry ultimately fails.
    pub fn monitor_connection(&mut self) {
        let check_interval = Duration::from_secs_f32(self.config.check_interval_secs);
        let mut last_check = Instant::now();

        while !self.stopped() {
            match self.transport.recv_line(POLL_SLICE) {
                Ok(Some(line)) => {
                    self.state.touch_data();
                    self.handle_line(&line);
                }
                Ok(None) => {}
                Err(e) => {
                    log::warn!("Link error: {}", e);
                    if !self.reconnect() {
                        break;
                    }
                }
            }

            if last_check.elapsed() >= check_interval {
                last_check = Instant::now();
                if self.state.is_connected() {
                    if let Some(idle) = self.state.secs_since_last_data() {
                        if idle > self.config.data_timeout_secs {
                            log::warn!(
                                "No data received for {:.0}s - connection may be lost",
                                idle
                            );
                            if !self.reconnect() {
                                break;
                            }
                        }
                    }
                }
            }
        }
    }

    fn reconnect(&mut self) -> bool {
        self.state.mark_disconnected();
        self.transport.disconnect();
        log::info!("Attempting to reconnect...");
        let ok = self.connect_with_retry();
        if ok {
            log::info!("Reconnected");
        } else if !self.stopped() {
            log::error!("Reconnection failed");
        }
        ok
    }

    /// Decode one inbound line and enqueue it. Non-data lines and decode
    /// failures are dropped silently; a full queue drops the newest record.
    fn handle_line(&mut self, line: &str) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return;
        }
        if trimmed.eq_ignore_ascii_case("ready") {
            log::debug!("Sensor pod ready");
            return;
        }

        if let Some(record) = TelemetryRecord::decode(trimmed) {
            match self.records.try_send(record) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    log::warn!("Inbound record queue full, dropping record");
                }
                // Main loop is gone; shutdown is imminent
                Err(TrySendError::Disconnected(_)) => {}
            }
        }
    }

    /// Interruptible wait. Returns false if a stop arrived while waiting.
    fn wait(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.stopped() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep((deadline - now).min(POLL_SLICE));
        }
    }
}

/// Spawn a supervisor on a named thread; returns the join handle.
pub fn spawn_supervisor<T: TelemetryTransport + 'static>(
    mut supervisor: ConnectionSupervisor<T>,
) -> Result<std::thread::JoinHandle<()>> {
    let handle = std::thread::Builder::new()
        .name("telemetry-supervisor".to_string())
        .spawn(move || supervisor.run())
        .map_err(|e| {
            crate::error::SurangError::Protocol(format!("Failed to spawn supervisor: {}", e))
        })?;
    Ok(handle)
}
