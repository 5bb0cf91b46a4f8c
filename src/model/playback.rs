//! Playback session state and the normalized progress signal

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::BackendKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PlayerState {
    #[default]
    Idle,
    Loading,
    Playing,
    Paused,
    Ended,
    Error,
}

/// What the UI shows on the progress bar
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Progress {
    pub current_time_seconds: f64,
    pub duration_seconds: f64,
    pub percentage: f64,
}

impl Progress {
    pub fn new(current_time_seconds: f64, duration_seconds: f64) -> Self {
        let current_time_seconds = current_time_seconds.max(0.0);
        let duration_seconds = duration_seconds.max(0.0);
        let percentage = if duration_seconds > 0.0 {
            (current_time_seconds / duration_seconds * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };
        Self {
            current_time_seconds,
            duration_seconds,
            percentage,
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }
}

/// The "now playing" record. A new session replaces the old one on every track start.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackSession {
    pub generation: u64,
    pub track_index: usize,
    pub active_backend_kind: Option<BackendKind>,
    pub state: PlayerState,
    pub current_time_seconds: f64,
    pub duration_seconds: f64,
    /// Set once the audio fallback has been tried for this session
    pub fallback_attempted: bool,
}

impl PlaybackSession {
    pub fn idle() -> Self {
        Self {
            generation: 0,
            track_index: 0,
            active_backend_kind: None,
            state: PlayerState::Idle,
            current_time_seconds: 0.0,
            duration_seconds: 0.0,
            fallback_attempted: false,
        }
    }

    pub fn start(generation: u64, track_index: usize) -> Self {
        Self {
            generation,
            track_index,
            state: PlayerState::Loading,
            ..Self::idle()
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayerState::Playing
    }

    pub fn progress(&self) -> Progress {
        Progress::new(self.current_time_seconds, self.duration_seconds)
    }

    /// Folds a poll sample in. An unknown or zero duration keeps the last known one.
    pub fn apply_sample(&mut self, current_time: Option<f64>, duration: Option<f64>) -> Progress {
        if let Some(t) = current_time.filter(|t| t.is_finite()) {
            self.current_time_seconds = t.max(0.0);
        }
        if let Some(d) = duration.filter(|d| d.is_finite() && *d > 0.0) {
            self.duration_seconds = d;
        }
        self.progress()
    }
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::idle()
    }
}

/// Lightweight state saved when the player loses visibility
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub current_index: usize,
    pub is_playing: bool,
    pub volume: f64,
    pub current_time: f64,
    pub saved_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_percentage_is_bounded() {
        assert_eq!(Progress::new(30.0, 120.0).percentage, 25.0);
        assert_eq!(Progress::new(130.0, 120.0).percentage, 100.0);
        assert_eq!(Progress::new(10.0, 0.0).percentage, 0.0);
        assert_eq!(Progress::zero(), Progress::new(0.0, 0.0));
    }

    #[test]
    fn sample_without_duration_keeps_previous() {
        let mut session = PlaybackSession::start(1, 0);
        let first = session.apply_sample(Some(5.0), Some(200.0));
        assert_eq!(first.duration_seconds, 200.0);

        let second = session.apply_sample(Some(50.0), Some(0.0));
        assert_eq!(second.duration_seconds, 200.0);
        assert_eq!(second.current_time_seconds, 50.0);
        assert_eq!(second.percentage, 25.0);

        let third = session.apply_sample(None, None);
        assert_eq!(third, second);
    }

    #[test]
    fn new_session_starts_loading_at_zero() {
        let session = PlaybackSession::start(7, 3);
        assert_eq!(session.state, PlayerState::Loading);
        assert_eq!(session.progress(), Progress::zero());
        assert_eq!(session.active_backend_kind, None);
        assert!(!session.fallback_attempted);
    }
}
