//! Buffered, crash-tolerant persistence of telemetry records.
//!
//! Records accumulate in an in-memory queue and are written in bulk, either
//! when the queue reaches its size threshold or on the owning loop's flush
//! interval. A failed write re-buffers the whole batch: records are only lost
//! if the process dies with them still queued.

use crate::error::Result;
use crate::telemetry::record::TelemetryRecord;
use rusqlite::{params, Connection};
use std::collections::VecDeque;
use std::path::Path;

/// Append-only telemetry table plus the indexes the dashboard queries on.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS sensor_data (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    co2 REAL, voc REAL, temp REAL, hum REAL,
    ax REAL, ay REAL, az REAL,
    gx REAL, gy REAL, gz REAL,
    pos_x REAL, pos_y REAL, yaw REAL
);
CREATE INDEX IF NOT EXISTS idx_timestamp ON sensor_data(timestamp);
CREATE INDEX IF NOT EXISTS idx_position ON sensor_data(pos_x, pos_y);
";

/// Persistence backend for telemetry batches.
pub trait RecordStore: Send {
    /// Write one batch atomically; all-or-nothing.
    fn insert_batch(&mut self, records: &[TelemetryRecord]) -> Result<usize>;
}

/// SQLite-backed record store.
///
/// WAL journaling keeps dashboard readers from ever blocking the writer.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::setup(&conn)?;
        log::info!("Database ready: {}", path.display());
        Ok(Self { conn })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::setup(&conn)?;
        Ok(Self { conn })
    }

    fn setup(conn: &Connection) -> Result<()> {
        conn.execute_batch(SCHEMA)?;
        // journal_mode returns the resulting mode as a row
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(())
    }

    /// Total persisted rows.
    pub fn row_count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM sensor_data", [], |row| row.get(0))?;
        Ok(count)
    }
}

impl RecordStore for SqliteStore {
    fn insert_batch(&mut self, records: &[TelemetryRecord]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO sensor_data
                 (timestamp, co2, voc, temp, hum, ax, ay, az, gx, gy, gz, pos_x, pos_y, yaw)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            )?;
            for r in records {
                stmt.execute(params![
                    r.timestamp,
                    r.co2,
                    r.voc,
                    r.temp,
                    r.hum,
                    r.ax,
                    r.ay,
                    r.az,
                    r.gx,
                    r.gy,
                    r.gz,
                    r.pos_x,
                    r.pos_y,
                    r.yaw,
                ])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }
}

/// Buffer statistics for the status line and final report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferStats {
    pub total_logged: u64,
    pub total_flushed: u64,
    pub buffered: usize,
}

/// Ordered in-memory queue in front of a [`RecordStore`].
pub struct TelemetryBuffer<S: RecordStore> {
    store: S,
    queue: VecDeque<TelemetryRecord>,
    threshold: usize,
    total_logged: u64,
    total_flushed: u64,
}

impl<S: RecordStore> TelemetryBuffer<S> {
    pub fn new(store: S, threshold: usize) -> Self {
        Self {
            store,
            queue: VecDeque::new(),
            threshold,
            total_logged: 0,
            total_flushed: 0,
        }
    }

    /// Enqueue one record. Never blocks.
    pub fn add(&mut self, record: TelemetryRecord) {
        self.queue.push_back(record);
        self.total_logged += 1;
    }

    /// True once the queue has reached the configured size threshold.
    pub fn should_flush(&self) -> bool {
        self.queue.len() >= self.threshold
    }

    /// Drain the queue into one bulk write.
    ///
    /// On a persistence failure the whole batch is re-buffered in its
    /// original order and retried on the next flush; returns the number of
    /// records actually written.
    pub fn flush(&mut self) -> usize {
        if self.queue.is_empty() {
            return 0;
        }

        let batch: Vec<TelemetryRecord> = self.queue.drain(..).collect();
        match self.store.insert_batch(&batch) {
            Ok(written) => {
                self.total_flushed += written as u64;
                log::debug!("Flushed {} records", written);
                written
            }
            Err(e) => {
                log::error!("Database write failed, re-buffering {} records: {}", batch.len(), e);
                for record in batch {
                    self.queue.push_back(record);
                }
                0
            }
        }
    }

    pub fn stats(&self) -> BufferStats {
        BufferStats {
            total_logged: self.total_logged,
            total_flushed: self.total_flushed,
            buffered: self.queue.len(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
