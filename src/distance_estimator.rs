// src/distance_estimator.rs
//
// Monocular pinhole distance from apparent object size:
//   distance = known_width * focal_length / pixel_size
//
// Calibration (per-class widths, focal length) is injected configuration so
// estimators can be tested with alternate calibrations independently.

use crate::types::CalibrationConfig;

pub struct DistanceEstimator {
    calibration: CalibrationConfig,
}

impl DistanceEstimator {
    pub fn new(calibration: CalibrationConfig) -> Self {
        Self { calibration }
    }

    /// Estimated distance in meters for an object of `class_id` whose
    /// apparent size is `pixel_size` pixels. Returns +∞ for non-positive
    /// sizes — the caller clamps bbox extents to ≥1px, so this is a
    /// defensive backstop, not an expected path.
    pub fn estimate(&self, class_id: u32, pixel_size: f32) -> f32 {
        if pixel_size <= 0.0 {
            return f32::INFINITY;
        }
        let known_width = self.known_width(class_id);
        (known_width * self.calibration.focal_length_px) / pixel_size
    }

    /// Real-world characteristic width (meters) for a class, with the
    /// configured fallback for unmapped ids.
    pub fn known_width(&self, class_id: u32) -> f32 {
        self.calibration
            .known_widths_m
            .get(&class_id)
            .copied()
            .unwrap_or(self.calibration.default_known_width_m)
    }

    /// Distance (meters) at or below which an object of this class is
    /// immediately dangerous regardless of velocity.
    pub fn critical_distance(&self, class_id: u32) -> f32 {
        self.calibration
            .critical_distances_m
            .get(&class_id)
            .copied()
            .unwrap_or(self.calibration.default_critical_distance_m)
    }
}
