//! Backend event listener

use crate::backend::{BackendEvent, TaggedEvent};
use crate::model::PlayerState;

use super::{PlaybackController, PlayerEventChannel};

impl PlaybackController {
    pub fn start_player_event_listener(&self, mut event_channel: PlayerEventChannel) {
        let controller = self.clone();
        tracing::info!("Starting backend event listener");

        tokio::spawn(async move {
            while let Some(event) = event_channel.recv().await {
                controller.handle_backend_event(event).await;
            }
            tracing::debug!("Backend event listener shutting down");
        });
    }

    /// Applies one backend event. Events from a superseded session, or from a
    /// backend that is no longer the active one, are dropped.
    pub async fn handle_backend_event(&self, tagged: TaggedEvent) {
        let mut state = self.state.lock().await;

        if !state.is_current(tagged.generation) {
            tracing::trace!(generation = tagged.generation, event = ?tagged.event, "Dropping stale backend event");
            return;
        }
        if state.session.active_backend_kind != Some(tagged.kind) {
            tracing::trace!(kind = ?tagged.kind, event = ?tagged.event, "Dropping event from inactive backend");
            return;
        }

        match tagged.event {
            BackendEvent::Playing => {
                tracing::trace!(generation = tagged.generation, "BackendEvent::Playing");
                state.session.state = PlayerState::Playing;
                self.ui.update_play_state(true);
                self.start_sync(&mut state);
            }
            BackendEvent::Paused => {
                tracing::debug!(generation = tagged.generation, "BackendEvent::Paused");
                state.session.state = PlayerState::Paused;
                state.stop_sync();
                self.ui.update_play_state(false);
            }
            BackendEvent::Buffering => {
                tracing::trace!(generation = tagged.generation, "BackendEvent::Buffering");
            }
            BackendEvent::Ended => {
                tracing::debug!(generation = tagged.generation, "BackendEvent::Ended");
                state.session.state = PlayerState::Ended;
                state.stop_sync();
                self.ui.update_play_state(false);
                drop(state);

                if let Err(e) = self.on_ended().await {
                    tracing::warn!(error = %e, "Could not continue after track end");
                }
            }
            BackendEvent::Error(error) => {
                tracing::warn!(generation = tagged.generation, kind = ?tagged.kind, error = %error, "BackendEvent::Error");
                state.stop_sync();
                state.stop_active_backend();
                let Some(track) = state.current_track().cloned() else {
                    return;
                };
                drop(state);

                if let Err(e) = self.recover(tagged.generation, &track, error).await {
                    tracing::debug!(error = %e, "Playback error was not recoverable");
                }
            }
        }
    }
}
