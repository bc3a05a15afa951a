// src/alarm.rs
//
// Two-state debounced collision warning driven by TTC.
//
// ON and OFF thresholds differ (2.0s / 2.5s by default): a TTC oscillating
// around a single boundary would otherwise flap the warning every frame.
// The gap between them is a dead band in which the current state is held.
//
// Contract: check() is called exactly once per frame with the frame-level
// worst-case TTC — the minimum finite TTC across hazardous tracks, or +∞
// when none are hazardous. Feeding it per-object TTCs would make the
// result order-dependent.

use crate::types::AlarmConfig;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmState {
    Inactive,
    Active,
}

pub struct HysteresisAlarm {
    state: AlarmState,
    config: AlarmConfig,
}

impl HysteresisAlarm {
    pub fn new(config: AlarmConfig) -> Self {
        Self {
            state: AlarmState::Inactive,
            config,
        }
    }

    /// Feed this frame's worst-case TTC; returns whether the warning is
    /// active after the transition.
    pub fn check(&mut self, ttc: f32) -> bool {
        match self.state {
            AlarmState::Inactive if ttc <= self.config.ttc_on_s => {
                info!("🔴 Collision warning ON (ttc={:.2}s)", ttc);
                self.state = AlarmState::Active;
            }
            AlarmState::Active if ttc >= self.config.ttc_off_s => {
                info!("🟢 Collision warning cleared (ttc={:.2}s)", ttc);
                self.state = AlarmState::Inactive;
            }
            _ => {} // dead band or no threshold crossed — hold state
        }
        self.state == AlarmState::Active
    }

    pub fn is_active(&self) -> bool {
        self.state == AlarmState::Active
    }

    pub fn state(&self) -> AlarmState {
        self.state
    }
}
