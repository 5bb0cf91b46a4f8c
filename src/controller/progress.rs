//! Progress synchronizer
//!
//! One polling loop for whichever backend is active. It reads time and
//! duration on a fixed cadence and republishes them as [`Progress`].

use tokio::time::{Instant, MissedTickBehavior};

use crate::model::Progress;

use super::{ControllerState, PlaybackController};

impl PlaybackController {
    /// Starts the polling loop for the current session unless one is running
    pub(crate) fn start_sync(&self, state: &mut ControllerState) {
        if state.sync_task.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }

        let generation = state.session.generation;
        let period = self.config.poll_interval();
        let controller = self.clone();
        tracing::debug!(generation, period_ms = period.as_millis() as u64, "Starting progress sync");

        state.sync_task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if controller.sync_tick(generation).await.is_none() {
                    tracing::trace!(generation, "Progress sync finished");
                    break;
                }
            }
        }));
    }

    /// Samples the active backend once and publishes the result.
    ///
    /// Returns `None` when the session is gone or no longer playing, which
    /// ends the loop. A tick with nothing to read publishes nothing.
    pub async fn sync_tick(&self, generation: u64) -> Option<Progress> {
        let mut state = self.state.lock().await;
        if !state.is_current(generation) || !state.session.is_playing() {
            return None;
        }

        // The slot is briefly empty while a resume is in flight
        let (current_time, duration) = match state.active.as_ref() {
            Some(backend) => (backend.current_time(), backend.duration()),
            None => return Some(state.session.progress()),
        };

        let had_duration = state.session.duration_seconds > 0.0;
        let progress = state.session.apply_sample(current_time, duration);

        if !had_duration && progress.duration_seconds > 0.0 {
            let index = state.session.track_index;
            let backfilled = state
                .playlist
                .get_mut(index)
                .is_some_and(|track| track.backfill_duration(progress.duration_seconds));
            if backfilled {
                tracing::debug!(index, duration = progress.duration_seconds, "Back-filled track duration");
                self.persist_playlist(&state.playlist);
                self.ui.render(&state.playlist, state.playlist.current_index());
            }
        }

        self.ui.update_progress(progress);
        Some(progress)
    }
}
