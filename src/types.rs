// src/types.rs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub calibration: CalibrationConfig,
    pub kinematics: KinematicsConfig,
    pub alarm: AlarmConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// Monocular pinhole calibration: per-class real-world widths and the
/// camera focal length used to convert apparent pixel size to meters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Calibrated focal length in pixels
    pub focal_length_px: f32,
    /// COCO class id → typical real-world width (meters)
    pub known_widths_m: HashMap<u32, f32>,
    /// Fallback width for class ids missing from the table
    pub default_known_width_m: f32,
    /// COCO class id → distance (meters) considered immediately dangerous
    pub critical_distances_m: HashMap<u32, f32>,
    /// Fallback critical distance for unmapped class ids
    pub default_critical_distance_m: f32,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            focal_length_px: 800.0,
            known_widths_m: HashMap::from([
                (1, 0.6), // person
                (2, 1.8), // car
                (3, 0.8), // motorcycle
                (5, 2.5), // bus
                (7, 2.3), // truck
            ]),
            default_known_width_m: 1.8,
            critical_distances_m: HashMap::from([
                (1, 1.5),
                (2, 1.8),
                (3, 2.5),
                (5, 2.0),
                (7, 2.0),
            ]),
            default_critical_distance_m: 1.8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KinematicsConfig {
    /// Source frame rate. Non-positive values fall back to 30 fps.
    pub fps: f32,
    /// EMA weight for new distance samples
    pub ema_alpha: f32,
    /// Retained samples per track window (distances and sizes)
    pub window_capacity: usize,
    /// Closing speeds below this magnitude (m/s) are treated as jitter,
    /// not genuine approach — no TTC is computed for them
    pub min_approach_speed_mps: f32,
    /// Bbox growth rate (px/frame) that triggers an immediate alert on its own
    pub expansion_alert_px_per_frame: f32,
}

impl Default for KinematicsConfig {
    fn default() -> Self {
        Self {
            fps: 30.0,
            ema_alpha: 0.4,
            window_capacity: 6,
            min_approach_speed_mps: 0.05,
            expansion_alert_px_per_frame: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmConfig {
    /// TTC (seconds) at or below which the warning switches on
    pub ttc_on_s: f32,
    /// TTC (seconds) at or above which the warning switches off.
    /// Must exceed ttc_on_s — the gap is the anti-flapping dead band.
    pub ttc_off_s: f32,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            ttc_on_s: 2.0,
            ttc_off_s: 2.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Class ids assessed for collision risk (COCO: 2=car, 3=motorcycle, 5=bus, 7=truck)
    pub alert_class_ids: Vec<u32>,
    /// Frame width in pixels. When set, detections outside the central ROI
    /// band are skipped (they still keep their tracks alive for reaping).
    pub frame_width_px: Option<f32>,
    /// Width of the central ROI band as a fraction of frame width
    pub roi_width_ratio: f32,
    /// TTC above this is reported as Safe rather than Caution
    pub safe_ttc_s: f32,
    /// TTC at or below this is reported as Danger
    pub danger_ttc_s: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            alert_class_ids: vec![2, 3, 5, 7],
            frame_width_px: None,
            roi_width_ratio: 0.6,
            safe_ttc_s: 3.0,
            danger_ttc_s: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// One detection from the upstream detector/tracker. Consumed per call,
/// never retained by the core.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Detection {
    /// Stable id assigned by the external tracker
    pub track_id: u32,
    /// [x1, y1, x2, y2] in pixels, x1<x2, y1<y2
    pub bbox: [f32; 4],
    pub class_id: u32,
}

impl Detection {
    pub fn center_x(&self) -> f32 {
        (self.bbox[0] + self.bbox[2]) * 0.5
    }
}

/// One frame of replay input: the detections the tracker reported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameRecord {
    pub frame_id: u64,
    pub detections: Vec<Detection>,
}

/// Per-object kinematic estimate for one frame.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ObjectAssessment {
    pub track_id: u32,
    pub class_id: u32,
    /// Smoothed distance (meters)
    pub distance_m: f32,
    /// Signed closing velocity (m/s); negative = approaching
    pub velocity_mps: f32,
    /// Seconds to collision at current closing speed, +∞ when not approaching
    pub ttc_s: f32,
    /// True when already critically close or inflating fast frame-to-frame
    pub immediate_alert: bool,
}

/// The single most urgent object in a frame (minimum finite TTC).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct UrgentObject {
    pub track_id: u32,
    pub class_id: u32,
    pub distance_m: f32,
    pub ttc_s: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ThreatLevel {
    /// No approaching object with a finite TTC
    Clear,
    Safe,
    Caution,
    Danger,
}

impl ThreatLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clear => "CLEAR",
            Self::Safe => "SAFE",
            Self::Caution => "CAUTION",
            Self::Danger => "DANGER",
        }
    }
}

/// Aggregate result for one processed frame.
#[derive(Debug, Clone, Serialize)]
pub struct FrameAssessment {
    pub frame_id: u64,
    pub objects: Vec<ObjectAssessment>,
    pub most_urgent: Option<UrgentObject>,
    pub threat_level: ThreatLevel,
    /// Debounced collision-warning flag from the hysteresis alarm
    pub warning_active: bool,
    /// warning_active OR any per-object immediate alert
    pub danger: bool,
}

/// Display label for a COCO class id.
pub fn class_name(class_id: u32) -> &'static str {
    match class_id {
        1 => "person",
        2 => "car",
        3 => "motorcycle",
        5 => "bus",
        7 => "truck",
        _ => "unknown",
    }
}
