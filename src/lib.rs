// src/lib.rs
//
// Monocular forward-collision warning core.
//
// Signal flow per frame:
//   Tracker detections → KinematicsEngine (distance / velocity / TTC /
//   immediate alert per object) → min finite TTC → HysteresisAlarm →
//   per-frame reap of stale track state
//
// Orchestrated by pipeline::WarningPipeline. Detection, tracking, video
// decode and rendering are external collaborators.

pub mod alarm;
pub mod config;
pub mod distance_estimator;
pub mod kinematics;
pub mod pipeline;
pub mod smoother;
pub mod track_history;
pub mod types;

// Re-exports for ergonomic access from binaries and integration tests
pub use alarm::{AlarmState, HysteresisAlarm};
pub use distance_estimator::DistanceEstimator;
pub use kinematics::{KinematicsEngine, KinematicsResult};
pub use pipeline::WarningPipeline;
pub use smoother::DistanceSmoother;
pub use track_history::{TrackHistory, TrackRecord};
pub use types::{
    class_name, Config, Detection, FrameAssessment, FrameRecord, ObjectAssessment, ThreatLevel,
    UrgentObject,
};
