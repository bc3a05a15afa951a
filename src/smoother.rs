// src/smoother.rs

use std::collections::{HashMap, HashSet};

/// Per-track exponential moving average of distance estimates.
///
/// The first observation of a track id seeds the filter unchanged; after
/// that each new sample is blended as `alpha * raw + (1 - alpha) * prev`.
/// State lives exactly as long as the track id: `reap` drops entries for
/// ids the tracker no longer reports.
pub struct DistanceSmoother {
    values: HashMap<u32, f32>,
    alpha: f32,
}

impl DistanceSmoother {
    pub fn new(alpha: f32) -> Self {
        Self {
            values: HashMap::new(),
            alpha,
        }
    }

    pub fn smooth(&mut self, track_id: u32, raw_value: f32) -> f32 {
        let prev = self.values.get(&track_id).copied().unwrap_or(raw_value);
        let smoothed = self.alpha * raw_value + (1.0 - self.alpha) * prev;
        self.values.insert(track_id, smoothed);
        smoothed
    }

    /// Drop state for every track id absent from `active_ids`.
    pub fn reap(&mut self, active_ids: &HashSet<u32>) {
        self.values.retain(|id, _| active_ids.contains(id));
    }

    pub fn contains(&self, track_id: u32) -> bool {
        self.values.contains_key(&track_id)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_seeds_filter() {
        let mut smoother = DistanceSmoother::new(0.4);
        assert_eq!(smoother.smooth(1, 7.2), 7.2);
    }

    #[test]
    fn test_output_lies_between_prev_and_raw() {
        let mut smoother = DistanceSmoother::new(0.4);
        smoother.smooth(1, 7.2);
        let s = smoother.smooth(1, 6.0);
        assert!(s > 6.0 && s < 7.2);
        // α=0.4: 0.4*6.0 + 0.6*7.2 = 6.72
        assert!((s - 6.72).abs() < 1e-5);
    }

    #[test]
    fn test_tracks_smooth_independently() {
        let mut smoother = DistanceSmoother::new(0.4);
        smoother.smooth(1, 10.0);
        smoother.smooth(2, 20.0);
        let s1 = smoother.smooth(1, 8.0);
        let s2 = smoother.smooth(2, 18.0);
        assert!((s1 - (0.4 * 8.0 + 0.6 * 10.0)).abs() < 1e-5);
        assert!((s2 - (0.4 * 18.0 + 0.6 * 20.0)).abs() < 1e-5);
    }

    #[test]
    fn test_reap_resets_state() {
        let mut smoother = DistanceSmoother::new(0.4);
        smoother.smooth(1, 10.0);
        smoother.reap(&HashSet::new());
        assert!(!smoother.contains(1));
        // Re-observed id seeds fresh, no leftover history
        assert_eq!(smoother.smooth(1, 4.0), 4.0);
    }
}
