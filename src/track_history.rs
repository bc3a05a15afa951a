// src/track_history.rs
//
// Bounded per-track state for the kinematics engine: short FIFO windows of
// smoothed distances and apparent pixel sizes, the last computed velocity,
// and a diagnostic update timestamp.
//
// Lifecycle contract:
//   - created on first sight of a track id (single-sample windows)
//   - mutated on every later detection of that id
//   - destroyed ONLY by reap() with the frame's active id set — never by
//     timeout. A reaped id seen again starts from scratch.

use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct TrackRecord {
    /// Recent smoothed distances (meters), oldest first
    pub distances: Vec<f32>,
    /// Recent apparent pixel sizes, oldest first
    pub sizes: Vec<f32>,
    /// Last computed signed velocity (m/s); negative = approaching
    pub velocity: f32,
    /// Diagnostic only — not part of any computed output
    pub last_update: Instant,
}

impl TrackRecord {
    fn bootstrap(distance: f32, size: f32) -> Self {
        Self {
            distances: vec![distance],
            sizes: vec![size],
            velocity: 0.0,
            last_update: Instant::now(),
        }
    }

    /// Append one sample to both windows, evicting the oldest once the
    /// window exceeds `capacity`.
    pub fn push(&mut self, distance: f32, size: f32, capacity: usize) {
        self.distances.push(distance);
        self.sizes.push(size);
        if self.distances.len() > capacity {
            self.distances.remove(0);
        }
        if self.sizes.len() > capacity {
            self.sizes.remove(0);
        }
        self.last_update = Instant::now();
    }
}

pub struct TrackHistory {
    records: HashMap<u32, TrackRecord>,
    capacity: usize,
}

impl TrackHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: HashMap::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains(&self, track_id: u32) -> bool {
        self.records.contains_key(&track_id)
    }

    pub fn get(&self, track_id: u32) -> Option<&TrackRecord> {
        self.records.get(&track_id)
    }

    pub fn get_mut(&mut self, track_id: u32) -> Option<&mut TrackRecord> {
        self.records.get_mut(&track_id)
    }

    /// First sighting of a track id: seed single-sample windows.
    pub fn insert_bootstrap(&mut self, track_id: u32, distance: f32, size: f32) {
        debug!("🆕 Track {} history created (d={:.1}m)", track_id, distance);
        self.records
            .insert(track_id, TrackRecord::bootstrap(distance, size));
    }

    /// Drop every record whose id is absent from `active_ids`. Called once
    /// per frame with the complete id set the tracker reported.
    pub fn reap(&mut self, active_ids: &HashSet<u32>) {
        let before = self.records.len();
        self.records.retain(|id, _| active_ids.contains(id));
        let evicted = before - self.records.len();
        if evicted > 0 {
            debug!(
                "🗑️  Reaped {} stale track(s), {} live",
                evicted,
                self.records.len()
            );
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
