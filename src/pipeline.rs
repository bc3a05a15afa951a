// src/pipeline.rs
//
// Per-frame orchestrator that wires together the kinematics engine and the
// hysteresis alarm. Single entry point: call process_frame() each frame with
// the tracker's detections.
//
// Per frame:
//   1. Collect the FULL active track-id set (before any filtering) — this
//      drives the reap, so a detection outside the ROI or class gate still
//      keeps its track state alive.
//   2. Gate detections: central-ROI band (optional) and alert classes.
//   3. KinematicsEngine::calculate per surviving detection.
//   4. Aggregate the minimum finite TTC ("most urgent object") and OR the
//      per-object immediate alerts.
//   5. Feed the alarm ONCE with that aggregate. Feeding it per object would
//      make the warning depend on detection iteration order.
//   6. Reap stale tracks.

use crate::alarm::HysteresisAlarm;
use crate::kinematics::KinematicsEngine;
use crate::types::{
    class_name, Config, Detection, FrameAssessment, ObjectAssessment, PipelineConfig, ThreatLevel,
    UrgentObject,
};
use std::collections::HashSet;
use tracing::{debug, info};

pub struct WarningPipeline {
    engine: KinematicsEngine,
    alarm: HysteresisAlarm,
    config: PipelineConfig,
    frame_count: u64,
    warning_frames: u64,
    last_threat: ThreatLevel,
}

impl WarningPipeline {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            engine: KinematicsEngine::new(config.calibration, config.kinematics),
            alarm: HysteresisAlarm::new(config.alarm),
            config: config.pipeline,
            frame_count: 0,
            warning_frames: 0,
            last_threat: ThreatLevel::Clear,
        }
    }

    /// Process one frame of detections. Must be called once per frame with
    /// everything the upstream tracker reported for that frame.
    pub fn process_frame(&mut self, detections: &[Detection], frame_id: u64) -> FrameAssessment {
        self.frame_count += 1;

        // Full id set, pre-filtering: gated-out detections must not be reaped
        let active_ids: HashSet<u32> = detections.iter().map(|d| d.track_id).collect();

        let mut objects: Vec<ObjectAssessment> = Vec::with_capacity(detections.len());
        let mut min_ttc = f32::INFINITY;
        let mut most_urgent: Option<UrgentObject> = None;
        let mut any_immediate = false;

        for det in detections {
            if !self.in_roi(det) {
                debug!(
                    "Track {} outside ROI band (cx={:.0}) — skipped",
                    det.track_id,
                    det.center_x()
                );
                continue;
            }
            if !self.config.alert_class_ids.contains(&det.class_id) {
                continue;
            }

            let result = self.engine.calculate(det.track_id, det.bbox, det.class_id);
            any_immediate |= result.immediate_alert;

            if result.ttc_s.is_finite() && result.ttc_s < min_ttc {
                min_ttc = result.ttc_s;
                most_urgent = Some(UrgentObject {
                    track_id: det.track_id,
                    class_id: det.class_id,
                    distance_m: result.distance_m,
                    ttc_s: result.ttc_s,
                });
            }

            objects.push(ObjectAssessment {
                track_id: det.track_id,
                class_id: det.class_id,
                distance_m: result.distance_m,
                velocity_mps: result.velocity_mps,
                ttc_s: result.ttc_s,
                immediate_alert: result.immediate_alert,
            });
        }

        // Exactly one alarm check per frame, with the frame-level worst case
        let warning_active = self.alarm.check(min_ttc);
        if warning_active {
            self.warning_frames += 1;
        }

        self.engine.reap(&active_ids);

        let threat_level = self.threat_level(min_ttc);
        if threat_level != self.last_threat {
            match &most_urgent {
                Some(urgent) => info!(
                    "F{}: {} → {} | {} T{} at {:.1}m, ttc={:.2}s",
                    frame_id,
                    self.last_threat.as_str(),
                    threat_level.as_str(),
                    class_name(urgent.class_id),
                    urgent.track_id,
                    urgent.distance_m,
                    urgent.ttc_s
                ),
                None => info!(
                    "F{}: {} → {}",
                    frame_id,
                    self.last_threat.as_str(),
                    threat_level.as_str()
                ),
            }
            self.last_threat = threat_level;
        }

        if self.frame_count % 150 == 0 {
            info!(
                "📊 F{}: tracks={} | assessed={} | min_ttc={:.2}s | warning={} | warned_frames={}",
                frame_id,
                self.engine.track_count(),
                objects.len(),
                min_ttc,
                warning_active,
                self.warning_frames
            );
        }

        FrameAssessment {
            frame_id,
            objects,
            most_urgent,
            threat_level,
            warning_active,
            danger: warning_active || any_immediate,
        }
    }

    fn in_roi(&self, det: &Detection) -> bool {
        let Some(frame_w) = self.config.frame_width_px else {
            return true; // no frame geometry configured — gate disabled
        };
        let half_band = frame_w * self.config.roi_width_ratio / 2.0;
        (det.center_x() - frame_w / 2.0).abs() <= half_band
    }

    fn threat_level(&self, min_ttc: f32) -> ThreatLevel {
        if min_ttc.is_infinite() {
            ThreatLevel::Clear
        } else if min_ttc > self.config.safe_ttc_s {
            ThreatLevel::Safe
        } else if min_ttc > self.config.danger_ttc_s {
            ThreatLevel::Caution
        } else {
            ThreatLevel::Danger
        }
    }

    pub fn tracked_count(&self) -> usize {
        self.engine.track_count()
    }

    pub fn warning_active(&self) -> bool {
        self.alarm.is_active()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frame_count
    }

    pub fn warning_frames(&self) -> u64 {
        self.warning_frames
    }
}

impl Default for WarningPipeline {
    fn default() -> Self {
        Self::new()
    }
}
