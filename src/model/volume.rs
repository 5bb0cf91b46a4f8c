//! Normalized volume and mute state

use serde::{Deserialize, Serialize};

pub const DEFAULT_VOLUME: f64 = 0.7;

// Levels are kept on a 1/1000 grid so that +x then -x lands on the same value.
fn quantize(level: f64) -> f64 {
    let level = if level.is_finite() { level.clamp(0.0, 1.0) } else { 0.0 };
    (level * 1000.0).round() / 1000.0
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeState {
    level: f64,
    muted: bool,
    pre_mute_level: f64,
}

impl Default for VolumeState {
    fn default() -> Self {
        Self::new(DEFAULT_VOLUME)
    }
}

impl VolumeState {
    pub fn new(level: f64) -> Self {
        let level = quantize(level);
        Self {
            level,
            muted: level == 0.0,
            pre_mute_level: level,
        }
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Volume actually handed to a backend
    pub fn effective(&self) -> f64 {
        if self.muted { 0.0 } else { self.level }
    }

    pub fn percent(&self) -> u8 {
        (self.effective() * 100.0).round() as u8
    }

    pub fn set(&mut self, level: f64) {
        self.level = quantize(level);
        self.pre_mute_level = self.level;
        self.muted = self.level == 0.0;
    }

    pub fn toggle_mute(&mut self) {
        if self.muted {
            self.level = self.pre_mute_level;
            self.muted = false;
        } else {
            self.pre_mute_level = self.level;
            self.level = 0.0;
            self.muted = true;
        }
    }

    /// Moves the level by `delta` snapped to the grid, so an adjustment and its
    /// negation cancel out anywhere away from the clamps
    pub fn adjust_by(&mut self, delta: f64) {
        let step = if delta.is_finite() { (delta * 1000.0).round() / 1000.0 } else { 0.0 };
        self.set(self.level + step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_clamps_and_tracks_mute() {
        let mut v = VolumeState::default();
        v.set(1.7);
        assert_eq!(v.level(), 1.0);
        assert!(!v.is_muted());
        v.set(-0.3);
        assert_eq!(v.level(), 0.0);
        assert!(v.is_muted());
        assert_eq!(v.effective(), 0.0);
        v.set(0.4);
        assert!(!v.is_muted());
        assert_eq!(v.effective(), 0.4);
    }

    #[test]
    fn toggle_mute_round_trips_exactly() {
        for step in 0..=100 {
            let level = step as f64 / 100.0;
            let mut v = VolumeState::new(0.5);
            v.set(level);
            let before = v.level();
            let was_muted = v.is_muted();
            v.toggle_mute();
            assert_ne!(v.is_muted(), was_muted);
            if !was_muted {
                assert_eq!(v.effective(), 0.0);
            }
            v.toggle_mute();
            assert_eq!(v.level(), before, "level {level}");
            assert_eq!(v.is_muted(), was_muted);
        }
    }

    #[test]
    fn adjust_round_trips_away_from_bounds() {
        for (start, delta) in [(0.7, 0.1), (0.3, 0.25), (0.5, 0.05), (0.123, 0.456)] {
            let mut v = VolumeState::new(start);
            v.adjust_by(delta);
            v.adjust_by(-delta);
            assert_eq!(v.level(), quantize(start), "start {start} delta {delta}");
        }
    }

    #[test]
    fn sub_grid_adjustments_round_trip() {
        for start in [0.3, 0.25, 0.5, 0.001] {
            for delta in [0.0005, 0.0015, 0.0025, 0.0004, 0.0104] {
                let mut v = VolumeState::new(start);
                v.adjust_by(delta);
                v.adjust_by(-delta);
                assert_eq!(v.level(), quantize(start), "start {start} delta {delta}");
            }
        }

        let mut v = VolumeState::new(0.3);
        v.adjust_by(0.0004);
        assert_eq!(v.level(), 0.3);
        v.adjust_by(0.0005);
        assert_eq!(v.level(), 0.301);
    }

    #[test]
    fn adjust_is_idempotent_at_the_clamps() {
        let mut v = VolumeState::new(1.0);
        v.adjust_by(0.2);
        assert_eq!(v.level(), 1.0);

        let mut v = VolumeState::new(0.05);
        v.adjust_by(-0.1);
        assert_eq!(v.level(), 0.0);
        assert!(v.is_muted());
        v.adjust_by(-0.1);
        assert_eq!(v.level(), 0.0);
        v.adjust_by(0.1);
        assert!(!v.is_muted());
        assert_eq!(v.level(), 0.1);
    }

    #[test]
    fn percent_reflects_mute() {
        let mut v = VolumeState::new(0.7);
        assert_eq!(v.percent(), 70);
        v.toggle_mute();
        assert_eq!(v.percent(), 0);
    }
}
