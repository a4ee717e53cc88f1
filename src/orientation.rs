//! Complementary filter for accelerometer + gyroscope fusion.
//!
//! Produces pitch, roll, yaw, and incline estimates from raw IMU samples.
//!
//! # Why Complementary Filter?
//!
//! | Source        | Strength                       | Weakness                   |
//! |---------------|--------------------------------|----------------------------|
//! | Accelerometer | Absolute tilt reference        | Noisy, confused by motion  |
//! | Gyroscope     | Smooth short-term rates        | Integrates bias → drift    |
//!
//! Pitch and roll are fused as a weighted combination:
//!
//! ```text
//! θ_fused = α × θ_gyro + (1 - α) × θ_accel
//! ```
//!
//! Yaw has no absolute reference on this platform (no magnetometer), so it is
//! gyro integration only and drifts over long runs.

use crate::config::FilterConfig;
use crate::utils::normalize_angle;
use std::time::Instant;

/// Filtered orientation estimate, angles in radians.
///
/// `yaw` is always normalized into (-π, π].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OrientationSample {
    pub pitch: f32,
    pub roll: f32,
    pub yaw: f32,
    /// Combined tilt magnitude: sqrt(pitch² + roll²)
    pub incline: f32,
}

/// Complementary filter fusing accelerometer and gyroscope samples.
///
/// Pure function of its inputs plus the previous filtered state; mutates
/// nothing outside itself.
#[derive(Debug)]
pub struct OrientationEstimator {
    config: FilterConfig,
    sample: OrientationSample,
    last_update: Option<Instant>,
}

impl OrientationEstimator {
    pub fn new(config: FilterConfig) -> Self {
        Self {
            config,
            sample: OrientationSample::default(),
            last_update: None,
        }
    }

    /// Get the most recent filtered sample.
    pub fn sample(&self) -> OrientationSample {
        self.sample
    }

    /// Fuse one IMU reading taken at `now`.
    ///
    /// Accelerations in m/s², rates in rad/s. A non-positive or implausibly
    /// large time step (clock jump, first call) is replaced by the nominal
    /// step from the filter configuration. A degenerate accelerometer vector
    /// falls back to the previous filtered tilt.
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        ax: f32,
        ay: f32,
        az: f32,
        gx: f32,
        gy: f32,
        gz: f32,
        now: Instant,
    ) -> OrientationSample {
        let dt = match self.last_update {
            Some(prev) => {
                let elapsed = now.duration_since(prev).as_secs_f32();
                if elapsed <= 0.0 || elapsed > self.config.max_dt_secs {
                    self.config.nominal_dt_secs
                } else {
                    elapsed
                }
            }
            None => self.config.nominal_dt_secs,
        };
        self.last_update = Some(now);

        // Tilt from the gravity vector
        let pitch_accel = {
            let p = ax.atan2((ay * ay + az * az).sqrt());
            if p.is_finite() { p } else { self.sample.pitch }
        };
        let roll_accel = {
            let r = ay.atan2((ax * ax + az * az).sqrt());
            if r.is_finite() { r } else { self.sample.roll }
        };

        // Integrated rates: gx rolls, gy pitches, gz yaws
        let pitch_gyro = self.sample.pitch + gy * dt;
        let roll_gyro = self.sample.roll + gx * dt;
        let yaw_gyro = self.sample.yaw + gz * dt;

        let alpha = self.config.alpha;
        let pitch = alpha * pitch_gyro + (1.0 - alpha) * pitch_accel;
        let roll = alpha * roll_gyro + (1.0 - alpha) * roll_accel;
        let yaw = normalize_angle(yaw_gyro);

        self.sample = OrientationSample {
            pitch,
            roll,
            yaw,
            incline: (pitch * pitch + roll * roll).sqrt(),
        };
        self.sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::PI;
    use std::time::Duration;

    fn test_config() -> FilterConfig {
        FilterConfig {
            alpha: 0.98,
            nominal_dt_secs: 0.02,
            max_dt_secs: 1.0,
        }
    }

    #[test]
    fn test_level_at_rest() {
        let mut est = OrientationEstimator::new(test_config());
        let t0 = Instant::now();

        // Gravity straight down, no rotation
        let mut sample = OrientationSample::default();
        for i in 0..100 {
            let now = t0 + Duration::from_millis(20 * i);
            sample = est.update(0.0, 0.0, 9.81, 0.0, 0.0, 0.0, now);
        }

        assert_relative_eq!(sample.pitch, 0.0, epsilon = 1e-4);
        assert_relative_eq!(sample.roll, 0.0, epsilon = 1e-4);
        assert_relative_eq!(sample.yaw, 0.0, epsilon = 1e-6);
        assert_relative_eq!(sample.incline, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_pitch_converges_to_accel_tilt() {
        let mut est = OrientationEstimator::new(test_config());
        let t0 = Instant::now();

        // 45° nose-up: ax = az = g/√2
        let g = 9.81f32 / 2.0f32.sqrt();
        let mut sample = OrientationSample::default();
        for i in 0..2000 {
            let now = t0 + Duration::from_millis(20 * i);
            sample = est.update(g, 0.0, g, 0.0, 0.0, 0.0, now);
        }

        // With alpha=0.98 the accel reference pulls the estimate to 45°
        assert_relative_eq!(sample.pitch, PI / 4.0, epsilon = 0.02);
        assert_relative_eq!(sample.roll, 0.0, epsilon = 0.02);
        assert!(sample.incline > 0.7);
    }

    #[test]
    fn test_yaw_integrates_gyro() {
        let mut est = OrientationEstimator::new(test_config());
        let t0 = Instant::now();

        est.update(0.0, 0.0, 9.81, 0.0, 0.0, 0.0, t0);
        // 1 rad/s for 0.5s
        let sample = est.update(
            0.0,
            0.0,
            9.81,
            0.0,
            0.0,
            1.0,
            t0 + Duration::from_millis(500),
        );

        assert_relative_eq!(sample.yaw, 0.5, epsilon = 1e-3);
    }

    #[test]
    fn test_yaw_stays_normalized() {
        let mut est = OrientationEstimator::new(test_config());
        let t0 = Instant::now();

        // Spin at 8 rad/s for 10 seconds: raw integral is 80 rad
        let mut sample = OrientationSample::default();
        for i in 0..500 {
            let now = t0 + Duration::from_millis(20 * i);
            sample = est.update(0.0, 0.0, 9.81, 0.0, 0.0, 8.0, now);
        }

        assert!(sample.yaw > -PI && sample.yaw <= PI, "yaw: {}", sample.yaw);
    }

    #[test]
    fn test_clock_jump_uses_nominal_dt() {
        let mut est = OrientationEstimator::new(test_config());
        let t0 = Instant::now();

        est.update(0.0, 0.0, 9.81, 0.0, 0.0, 0.0, t0);
        // 100s gap with fast yaw rate: nominal dt (0.02s) must be substituted,
        // so yaw moves by 0.02 rad, not 100 rad
        let sample = est.update(0.0, 0.0, 9.81, 0.0, 0.0, 1.0, t0 + Duration::from_secs(100));

        assert_relative_eq!(sample.yaw, 0.02, epsilon = 1e-4);
    }

    #[test]
    fn test_degenerate_accel_keeps_previous_tilt() {
        let mut est = OrientationEstimator::new(test_config());
        let t0 = Instant::now();

        // Establish a tilt first
        let g = 9.81f32 / 2.0f32.sqrt();
        let mut before = OrientationSample::default();
        for i in 0..500 {
            before = est.update(g, 0.0, g, 0.0, 0.0, 0.0, t0 + Duration::from_millis(20 * i));
        }

        // NaN accelerometer reading: previous filtered tilt is reused
        let after = est.update(
            f32::NAN,
            f32::NAN,
            f32::NAN,
            0.0,
            0.0,
            0.0,
            t0 + Duration::from_millis(20 * 500),
        );

        assert!(after.pitch.is_finite());
        assert_relative_eq!(after.pitch, before.pitch, epsilon = 1e-3);
        assert_relative_eq!(after.roll, before.roll, epsilon = 1e-3);
    }

    #[test]
    fn test_sample_read_is_idempotent() {
        let mut est = OrientationEstimator::new(test_config());
        est.update(0.1, 0.2, 9.8, 0.01, 0.02, 0.03, Instant::now());
        assert_eq!(est.sample(), est.sample());
    }
}
