//! Shared state between the supervisor thread and the main control loop.
//!
//! `ConnectionState` is the only state touched by more than one thread
//! besides the inbound record channel. The supervisor is the sole writer of
//! the connection flags; the main loop only reads them for the status line.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Telemetry link state, written by [`ConnectionSupervisor`] only.
///
/// [`ConnectionSupervisor`]: crate::telemetry::ConnectionSupervisor
#[derive(Debug)]
pub struct ConnectionState {
    /// Whether the link is currently up
    connected: AtomicBool,

    /// Number of successful connects (1 = initial connect, >1 = reconnects)
    reconnect_count: AtomicU32,

    /// Unix time of the last inbound line, in milliseconds (0 = never)
    last_data_ms: AtomicU64,
}

impl ConnectionState {
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
            reconnect_count: AtomicU32::new(0),
            last_data_ms: AtomicU64::new(0),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn reconnect_count(&self) -> u32 {
        self.reconnect_count.load(Ordering::Relaxed)
    }

    /// Mark the link up and count the connect.
    pub fn mark_connected(&self) {
        self.reconnect_count.fetch_add(1, Ordering::Relaxed);
        self.connected.store(true, Ordering::Release);
        self.touch_data();
    }

    /// Mark the link down.
    pub fn mark_disconnected(&self) {
        self.connected.store(false, Ordering::Release);
    }

    /// Record that inbound data arrived now.
    pub fn touch_data(&self) {
        self.last_data_ms.store(now_ms(), Ordering::Release);
    }

    /// Seconds since the last inbound line, or `None` if nothing has arrived yet.
    pub fn secs_since_last_data(&self) -> Option<f32> {
        let last = self.last_data_ms.load(Ordering::Acquire);
        if last == 0 {
            return None;
        }
        Some((now_ms().saturating_sub(last)) as f32 / 1000.0)
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::new()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = ConnectionState::new();
        assert!(!state.is_connected());
        assert_eq!(state.reconnect_count(), 0);
        assert!(state.secs_since_last_data().is_none());
    }

    #[test]
    fn test_connect_disconnect_cycle() {
        let state = ConnectionState::new();

        state.mark_connected();
        assert!(state.is_connected());
        assert_eq!(state.reconnect_count(), 1);
        assert!(state.secs_since_last_data().unwrap() < 1.0);

        state.mark_disconnected();
        assert!(!state.is_connected());

        state.mark_connected();
        assert_eq!(state.reconnect_count(), 2);
    }
}
