//! Telemetry transport trait, TCP implementation, and scripted mock.
//!
//! The radio/BLE bridge presents the pod as a newline-delimited UTF-8 stream;
//! this module only deals in lines. Pairing and the raw link live outside
//! this crate.

use crate::error::{Result, SurangError};
use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

/// Line-oriented telemetry link.
pub trait TelemetryTransport: Send {
    /// Try to establish the link within `timeout`.
    fn connect(&mut self, timeout: Duration) -> Result<()>;

    /// Tear the link down. Safe to call when already disconnected.
    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    /// Send one line (the newline is appended here).
    fn send_line(&mut self, line: &str) -> Result<()>;

    /// Wait up to `timeout` for one inbound line. `Ok(None)` on timeout;
    /// `Err` on a broken link.
    fn recv_line(&mut self, timeout: Duration) -> Result<Option<String>>;
}

/// TCP transport carrying newline-delimited UTF-8 lines.
pub struct TcpLineTransport {
    addr: String,
    stream: Option<TcpStream>,
    pending: Vec<u8>,
}

impl TcpLineTransport {
    pub fn new(addr: &str) -> Self {
        Self {
            addr: addr.to_string(),
            stream: None,
            pending: Vec::new(),
        }
    }

    /// Pull the next complete line out of the pending buffer.
    fn take_pending_line(&mut self) -> Option<String> {
        let pos = self.pending.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
        line.pop(); // the newline itself
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }
}

impl TelemetryTransport for TcpLineTransport {
    fn connect(&mut self, timeout: Duration) -> Result<()> {
        let sock_addr: std::net::SocketAddr = self
            .addr
            .parse()
            .map_err(|e| SurangError::Config(format!("Invalid address {}: {}", self.addr, e)))?;

        let stream = TcpStream::connect_timeout(&sock_addr, timeout)?;
        self.pending.clear();
        self.stream = Some(stream);
        log::debug!("TCP link up: {}", self.addr);
        Ok(())
    }

    fn disconnect(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(std::net::Shutdown::Both);
            log::debug!("TCP link down: {}", self.addr);
        }
        self.pending.clear();
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn send_line(&mut self, line: &str) -> Result<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| SurangError::Protocol("not connected".to_string()))?;
        stream.write_all(line.as_bytes())?;
        stream.write_all(b"\n")?;
        stream.flush()?;
        Ok(())
    }

    fn recv_line(&mut self, timeout: Duration) -> Result<Option<String>> {
        if let Some(line) = self.take_pending_line() {
            return Ok(Some(line));
        }

        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| SurangError::Protocol("not connected".to_string()))?;
        stream.set_read_timeout(Some(timeout))?;

        let mut buf = [0u8; 1024];
        match stream.read(&mut buf) {
            Ok(0) => {
                // Peer closed the link
                self.disconnect();
                Err(SurangError::Connection(std::io::Error::new(
                    ErrorKind::UnexpectedEof,
                    "peer closed connection",
                )))
            }
            Ok(n) => {
                self.pending.extend_from_slice(&buf[..n]);
                Ok(self.take_pending_line())
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                Ok(None)
            }
            Err(e) => {
                self.disconnect();
                Err(e.into())
            }
        }
    }
}

/// Scripted transport for tests and bench runs.
///
/// Connect attempts succeed or fail according to a script (and always succeed
/// once the script runs out); inbound lines are popped from a queue; sent
/// lines are recorded.
#[derive(Debug, Default)]
pub struct MockTransport {
    connect_script: VecDeque<bool>,
    connect_attempts: usize,
    connected: bool,
    inbound: VecDeque<String>,
    sent: Vec<String>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the outcome of the next connect attempts, in order.
    pub fn script_connects(&mut self, outcomes: &[bool]) {
        self.connect_script.extend(outcomes.iter().copied());
    }

    /// Queue an inbound line.
    pub fn push_inbound(&mut self, line: &str) {
        self.inbound.push_back(line.to_string());
    }

    pub fn connect_attempts(&self) -> usize {
        self.connect_attempts
    }

    pub fn sent_lines(&self) -> &[String] {
        &self.sent
    }
}

impl TelemetryTransport for MockTransport {
    fn connect(&mut self, _timeout: Duration) -> Result<()> {
        self.connect_attempts += 1;
        match self.connect_script.pop_front() {
            Some(false) => Err(SurangError::Connection(std::io::Error::new(
                ErrorKind::TimedOut,
                "scripted connect failure",
            ))),
            _ => {
                self.connected = true;
                Ok(())
            }
        }
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn send_line(&mut self, line: &str) -> Result<()> {
        if !self.connected {
            return Err(SurangError::Protocol("not connected".to_string()));
        }
        self.sent.push(line.to_string());
        Ok(())
    }

    fn recv_line(&mut self, timeout: Duration) -> Result<Option<String>> {
        if !self.connected {
            return Err(SurangError::Protocol("not connected".to_string()));
        }
        match self.inbound.pop_front() {
            Some(line) => Ok(Some(line)),
            None => {
                // Emulate the poll timeout without stalling the test suite
                std::thread::sleep(timeout.min(Duration::from_millis(2)));
                Ok(None)
            }
        }
    }
}
