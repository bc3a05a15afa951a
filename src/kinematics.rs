// src/kinematics.rs
//
// Central per-detection estimator. For each (track_id, bbox, class_id) it
// produces a smoothed distance, a finite-difference closing velocity over a
// short sample window, a time-to-collision, and an immediate-alert flag.
//
// Signal flow per detection:
//   bbox → pixel size → pinhole distance → per-track EMA → bounded windows
//        → velocity (mean consecutive diff / seconds-per-frame)
//        → TTC (only when genuinely approaching)
//        → immediate alert (critically close OR bbox inflating fast)
//
// The engine owns all per-track state (windows + EMA values) and is the
// only writer. One engine per video session; call reap() once per frame to
// keep memory bounded.

use crate::distance_estimator::DistanceEstimator;
use crate::smoother::DistanceSmoother;
use crate::track_history::TrackHistory;
use crate::types::{CalibrationConfig, KinematicsConfig};
use std::collections::HashSet;
use tracing::debug;

/// Per-detection output: the four estimated quantities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicsResult {
    /// Smoothed distance (meters)
    pub distance_m: f32,
    /// Signed velocity (m/s); negative = approaching
    pub velocity_mps: f32,
    /// Seconds to collision, +∞ when not approaching
    pub ttc_s: f32,
    /// Critically close or closing fast enough that bbox growth alone alarms
    pub immediate_alert: bool,
}

impl KinematicsResult {
    fn bootstrap(distance_m: f32) -> Self {
        Self {
            distance_m,
            velocity_mps: 0.0,
            ttc_s: f32::INFINITY,
            immediate_alert: false,
        }
    }
}

pub struct KinematicsEngine {
    estimator: DistanceEstimator,
    smoother: DistanceSmoother,
    history: TrackHistory,
    config: KinematicsConfig,
    seconds_per_frame: f32,
}

impl KinematicsEngine {
    pub fn new(calibration: CalibrationConfig, config: KinematicsConfig) -> Self {
        let seconds_per_frame = if config.fps > 0.0 {
            1.0 / config.fps
        } else {
            1.0 / 30.0
        };
        Self {
            estimator: DistanceEstimator::new(calibration),
            smoother: DistanceSmoother::new(config.ema_alpha),
            history: TrackHistory::new(config.window_capacity),
            config,
            seconds_per_frame,
        }
    }

    pub fn seconds_per_frame(&self) -> f32 {
        self.seconds_per_frame
    }

    /// Estimate distance / velocity / TTC / immediate alert for one
    /// detection. Invoked once per detection per frame.
    ///
    /// The first sighting of a track id returns inert comparative values —
    /// `(distance, 0.0, +∞, false)` — because no history exists yet to
    /// difference against.
    pub fn calculate(&mut self, track_id: u32, bbox: [f32; 4], class_id: u32) -> KinematicsResult {
        // Degenerate extents clamp to 1px: a malformed detection degrades
        // the estimate, it never aborts the frame loop.
        let width = (bbox[2] - bbox[0]).max(1.0);
        let height = (bbox[3] - bbox[1]).max(1.0);
        let pixel_size = (width + height) / 2.0;

        let raw_distance = self.estimator.estimate(class_id, pixel_size);
        let distance = self.smoother.smooth(track_id, raw_distance);

        if !self.history.contains(track_id) {
            self.history.insert_bootstrap(track_id, distance, pixel_size);
            return KinematicsResult::bootstrap(distance);
        }

        let capacity = self.history.capacity();
        let record = self
            .history
            .get_mut(track_id)
            .expect("record exists: contains() checked above");
        record.push(distance, pixel_size, capacity);

        let velocity = mean_consecutive_diff(&record.distances) / self.seconds_per_frame;
        let size_expansion_rate = mean_consecutive_diff(&record.sizes);
        record.velocity = velocity;

        // TTC only when the object is genuinely approaching; closing speeds
        // below the noise floor stay at +∞ rather than producing huge,
        // jitter-driven TTC values.
        let ttc = if velocity < -self.config.min_approach_speed_mps {
            distance / (-velocity)
        } else {
            f32::INFINITY
        };

        // Two independent triggers, OR-combined: already dangerously close,
        // or the bbox is inflating so fast that growth alone is alarming.
        let critical = self.estimator.critical_distance(class_id);
        let too_close = distance <= critical;
        let inflating = size_expansion_rate >= self.config.expansion_alert_px_per_frame;
        let immediate_alert = too_close || inflating;

        if immediate_alert {
            debug!(
                "🚨 Track {}: immediate alert (d={:.1}m crit={:.1}m, growth={:.1}px/f)",
                track_id, distance, critical, size_expansion_rate
            );
        }

        KinematicsResult {
            distance_m: distance,
            velocity_mps: velocity,
            ttc_s: ttc,
            immediate_alert,
        }
    }

    /// Drop all state for track ids the tracker no longer reports. Windows
    /// and EMA values are cleared in lockstep — after any reap both stores
    /// hold exactly the same key set.
    pub fn reap(&mut self, active_ids: &HashSet<u32>) {
        self.history.reap(active_ids);
        self.smoother.reap(active_ids);
        debug_assert_eq!(self.history.len(), self.smoother.len());
    }

    pub fn track_count(&self) -> usize {
        self.history.len()
    }

    pub fn history(&self) -> &TrackHistory {
        &self.history
    }
}

/// Mean of consecutive differences, i.e. average per-sample change across
/// the window. Zero for windows shorter than two samples.
fn mean_consecutive_diff(values: &[f32]) -> f32 {
    if values.len() < 2 {
        return 0.0;
    }
    let sum: f32 = values.windows(2).map(|w| w[1] - w[0]).sum();
    sum / (values.len() - 1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> KinematicsEngine {
        KinematicsEngine::new(CalibrationConfig::default(), KinematicsConfig::default())
    }

    /// Square bbox whose averaged width/height equals `size` pixels.
    fn bbox_of_size(size: f32) -> [f32; 4] {
        [100.0, 50.0, 100.0 + size, 50.0 + size]
    }

    #[test]
    fn test_first_sighting_is_inert() {
        let mut engine = engine();
        let result = engine.calculate(1, bbox_of_size(200.0), 2);
        // car 1.8m * 800px / 200px = 7.2m
        assert!((result.distance_m - 7.2).abs() < 1e-4);
        assert_eq!(result.velocity_mps, 0.0);
        assert!(result.ttc_s.is_infinite());
        assert!(!result.immediate_alert);
    }

    #[test]
    fn test_approaching_car_gets_finite_ttc() {
        let mut engine = engine();
        engine.calculate(1, bbox_of_size(200.0), 2); // 7.2m, bootstrap

        // Bigger bbox next frame: 240px → raw 6.0m, smoothed 6.72m
        let result = engine.calculate(1, bbox_of_size(240.0), 2);
        assert!((result.distance_m - 6.72).abs() < 1e-4);

        // Window [7.2, 6.72] at 30fps: −0.48m/frame → −14.4 m/s
        assert!(result.velocity_mps < 0.0, "must register approach");
        assert!((result.velocity_mps + 14.4).abs() < 1e-3);

        // TTC = 6.72 / 14.4 ≈ 0.467s
        assert!(result.ttc_s.is_finite() && result.ttc_s > 0.0);
        assert!((result.ttc_s - 6.72 / 14.4).abs() < 1e-3);

        // Size window grew 40px in one frame — expansion trigger fires
        assert!(result.immediate_alert);
    }

    #[test]
    fn test_critical_distance_alerts_without_approach() {
        // 960px apparent size → 1.5m, inside the car critical distance of
        // 1.8m. Velocity stays 0 and TTC +∞ — the OR-combination of the
        // triggers must alert on proximity alone.
        let mut engine = engine();
        engine.calculate(1, bbox_of_size(960.0), 2);
        let result = engine.calculate(1, bbox_of_size(960.0), 2);

        assert!((result.distance_m - 1.5).abs() < 1e-4);
        assert_eq!(result.velocity_mps, 0.0);
        assert!(result.ttc_s.is_infinite());
        assert!(result.immediate_alert);
    }

    #[test]
    fn test_receding_object_never_gets_ttc() {
        let mut engine = engine();
        engine.calculate(1, bbox_of_size(240.0), 2); // 6.0m
        let result = engine.calculate(1, bbox_of_size(200.0), 2); // raw 7.2m

        assert!(result.velocity_mps > 0.0);
        assert!(result.ttc_s.is_infinite());
        assert!(!result.immediate_alert);
    }

    #[test]
    fn test_degenerate_bbox_clamps_instead_of_failing() {
        let mut engine = engine();
        // Zero-width box: clamps to 1px, estimate degrades but stays finite
        let result = engine.calculate(1, [50.0, 50.0, 50.0, 80.0], 2);
        assert!(result.distance_m.is_finite());
        assert!(result.distance_m > 0.0);
    }

    #[test]
    fn test_windows_stay_bounded_over_long_tracks() {
        let mut engine = engine();
        for i in 0..10 {
            engine.calculate(1, bbox_of_size(200.0 + i as f32), 2);
        }
        let record = engine.history().get(1).unwrap();
        assert_eq!(record.distances.len(), 6);
        assert_eq!(record.sizes.len(), 6);
    }

    #[test]
    fn test_reap_resets_track_identity() {
        let mut engine = engine();
        engine.calculate(1, bbox_of_size(200.0), 2);
        engine.calculate(1, bbox_of_size(240.0), 2);
        engine.reap(&HashSet::new());
        assert_eq!(engine.track_count(), 0);

        // Same id re-observed behaves exactly like a brand-new track
        let result = engine.calculate(1, bbox_of_size(300.0), 2);
        assert_eq!(result.velocity_mps, 0.0);
        assert!(result.ttc_s.is_infinite());
        assert!(!result.immediate_alert);
        // EMA re-seeded from the raw value, no leftover smoothing
        assert!((result.distance_m - 1.8 * 800.0 / 300.0).abs() < 1e-4);
    }

    #[test]
    fn test_identical_input_sequences_are_deterministic() {
        let sequence = [
            (1u32, 200.0f32, 2u32),
            (1, 210.0, 2),
            (2, 150.0, 7),
            (1, 225.0, 2),
            (2, 160.0, 7),
            (1, 245.0, 2),
        ];
        let mut a = engine();
        let mut b = engine();
        for (id, size, class) in sequence {
            let ra = a.calculate(id, bbox_of_size(size), class);
            let rb = b.calculate(id, bbox_of_size(size), class);
            assert_eq!(ra, rb);
        }
    }

    #[test]
    fn test_non_positive_fps_falls_back_to_30() {
        let config = KinematicsConfig {
            fps: 0.0,
            ..KinematicsConfig::default()
        };
        let engine = KinematicsEngine::new(CalibrationConfig::default(), config);
        assert!((engine.seconds_per_frame() - 1.0 / 30.0).abs() < 1e-6);
    }

    #[test]
    fn test_mean_consecutive_diff() {
        assert_eq!(mean_consecutive_diff(&[]), 0.0);
        assert_eq!(mean_consecutive_diff(&[5.0]), 0.0);
        assert!((mean_consecutive_diff(&[7.2, 6.72]) + 0.48).abs() < 1e-5);
        // (last - first) / (n - 1) for any monotone window
        assert!((mean_consecutive_diff(&[10.0, 9.0, 7.0, 4.0]) + 2.0).abs() < 1e-5);
    }
}
