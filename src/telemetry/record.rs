//! Telemetry record type and wire decoding.
//!
//! The sensor pod sends newline-delimited UTF-8. Each data message is a flat
//! JSON object whose keys are a subset of the record fields below; the
//! out-of-band control tokens `"Start"` and `"ready"` are bare strings and
//! fail JSON-object decoding, which is how they stay out of the data path.

use serde::{Deserialize, Serialize};

/// One fused sensor reading.
///
/// Every numeric field is optional; the timestamp is assigned when the
/// record is decoded. Immutable once buffered.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TelemetryRecord {
    #[serde(default)]
    pub timestamp: String,

    // Environment
    pub co2: Option<f64>,
    pub voc: Option<f64>,
    pub temp: Option<f64>,
    pub hum: Option<f64>,

    // Raw IMU
    pub ax: Option<f64>,
    pub ay: Option<f64>,
    pub az: Option<f64>,
    pub gx: Option<f64>,
    pub gy: Option<f64>,
    pub gz: Option<f64>,

    // Pose, stamped by the controller before buffering
    pub pos_x: Option<f64>,
    pub pos_y: Option<f64>,
    pub yaw: Option<f64>,
}

impl TelemetryRecord {
    /// Decode one wire line. Returns `None` for anything that is not a JSON
    /// object (control tokens, garbage); decode faults never stop the link.
    pub fn decode(line: &str) -> Option<Self> {
        let mut record: TelemetryRecord = serde_json::from_str(line).ok()?;
        record.timestamp = chrono::Local::now().to_rfc3339();
        Some(record)
    }

    /// The six raw IMU values, if the pod sent all of them.
    pub fn imu(&self) -> Option<[f32; 6]> {
        Some([
            self.ax? as f32,
            self.ay? as f32,
            self.az? as f32,
            self.gx? as f32,
            self.gy? as f32,
            self.gz? as f32,
        ])
    }
}
