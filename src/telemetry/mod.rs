//! Telemetry link, decoding, and buffered persistence.
//!
//! Inbound flow: transport line → [`ConnectionSupervisor`] decode →
//! bounded record channel → main loop stamps the pose → [`TelemetryBuffer`]
//! → SQLite.

mod buffer;
mod record;
mod supervisor;
mod transport;

pub use buffer::{BufferStats, RecordStore, SqliteStore, TelemetryBuffer};
pub use record::TelemetryRecord;
pub use supervisor::{spawn_supervisor, ConnectionSupervisor, SupervisorHandle};
pub use transport::{MockTransport, TcpLineTransport, TelemetryTransport};
