//! Playlist navigation, editing and loading

use chrono::Utc;

use crate::error::{PlayerError, PlayerResult};
use crate::model::{
    apply_policy, builtin_playlist, normalize_remote, PlayerState, Progress, SessionSnapshot, Track,
    TrackDraft, TrackKind,
};

use super::PlaybackController;

impl PlaybackController {
    pub async fn next(&self) -> PlayerResult<()> {
        let target = self.state.lock().await.playlist.next_index();
        match target {
            Some(index) => {
                tracing::debug!(index, "Skipping to next track");
                self.play_track(index).await
            }
            None => Ok(()),
        }
    }

    pub async fn previous(&self) -> PlayerResult<()> {
        let target = self.state.lock().await.playlist.previous_index();
        match target {
            Some(index) => {
                tracing::debug!(index, "Going back to previous track");
                self.play_track(index).await
            }
            None => Ok(()),
        }
    }

    /// Natural end of the current track
    pub async fn on_ended(&self) -> PlayerResult<()> {
        let (repeat, index) = {
            let state = self.state.lock().await;
            (state.playlist.repeat_enabled, state.session.track_index)
        };

        if !repeat {
            return self.next().await;
        }

        tracing::debug!(index, "Repeating track");
        match self.resume_active(Some(0.0)).await {
            Ok(true) => Ok(()),
            Ok(false) => self.play_track(index).await,
            Err(e) => {
                tracing::warn!(error = %e, "Could not rewind, restarting track");
                self.play_track(index).await
            }
        }
    }

    pub async fn find_next_playable(&self, from: usize) -> Option<usize> {
        self.state.lock().await.playlist.find_next_playable(from)
    }

    pub async fn toggle_shuffle(&self) -> bool {
        let mut state = self.state.lock().await;
        state.playlist.shuffle_enabled = !state.playlist.shuffle_enabled;
        let (shuffle, repeat) = (state.playlist.shuffle_enabled, state.playlist.repeat_enabled);
        self.ui.update_modes(shuffle, repeat);
        tracing::info!(shuffle, "Shuffle toggled");
        shuffle
    }

    pub async fn toggle_repeat(&self) -> bool {
        let mut state = self.state.lock().await;
        state.playlist.repeat_enabled = !state.playlist.repeat_enabled;
        let (shuffle, repeat) = (state.playlist.shuffle_enabled, state.playlist.repeat_enabled);
        self.ui.update_modes(shuffle, repeat);
        tracing::info!(repeat, "Repeat toggled");
        repeat
    }

    /// Validates and appends a user-entered track. Plays it when it is the only one.
    pub async fn add_track(&self, draft: TrackDraft) -> PlayerResult<usize> {
        let track = match Track::from_draft(draft) {
            Ok(track) => apply_policy(track, self.config.unplayable_policy),
            Err(e) => {
                self.ui.notify_error(&Self::describe_error(&e, None));
                return Err(e);
            }
        };

        let (index, only_track) = {
            let mut state = self.state.lock().await;
            let title = track.title.clone();
            let index = state.playlist.push(track);
            self.persist_playlist(&state.playlist);
            self.ui.render(&state.playlist, state.playlist.current_index());
            self.ui.notify_success(&format!("Added \"{}\"", title));
            tracing::info!(index, title = %title, "Track added");
            (index, state.playlist.len() == 1)
        };

        if only_track {
            if let Err(e) = self.play_track(index).await {
                tracing::debug!(error = %e, "New track did not start");
            }
        }
        Ok(index)
    }

    /// Asks the UI for a track; a cancelled prompt is not an error
    pub async fn add_track_from_prompt(&self) -> PlayerResult<()> {
        match self.ui.prompt_add_track().await {
            Some(draft) => self.add_track(draft).await.map(|_| ()),
            None => {
                tracing::debug!("Add track cancelled");
                Ok(())
            }
        }
    }

    pub async fn delete_track(&self, index: usize) -> PlayerResult<()> {
        let restart = {
            let mut state = self.state.lock().await;
            let len = state.playlist.len();
            let Some((removed, was_current)) = state.playlist.remove(index) else {
                return Err(PlayerError::IndexOutOfRange { index, len });
            };
            tracing::info!(index, title = %removed.title, was_current, "Track deleted");

            let restart = if was_current {
                state.reset_session();
                self.ui.update_progress(Progress::zero());
                self.ui.update_play_state(false);
                (!state.playlist.is_empty()).then(|| state.playlist.current_index())
            } else {
                if index < state.session.track_index {
                    state.session.track_index -= 1;
                }
                None
            };

            self.persist_playlist(&state.playlist);
            self.ui.render(&state.playlist, state.playlist.current_index());
            restart
        };

        match restart {
            Some(target) => self.play_track(target).await,
            None => Ok(()),
        }
    }

    /// Installs a new playlist. Playback stops and the cursor goes back to the start.
    pub async fn replace_playlist(&self, tracks: Vec<Track>) {
        let mut state = self.state.lock().await;
        state.playlist.replace(tracks);
        state.reset_session();
        self.persist_playlist(&state.playlist);
        self.ui.update_progress(Progress::zero());
        self.ui.update_play_state(false);
        self.ui.render(&state.playlist, 0);
        tracing::info!(len = state.playlist.len(), "Playlist replaced");
    }

    /// Fetches the remote playlist. On failure the built-in list is installed instead.
    pub async fn load_remote_playlist(&self) -> PlayerResult<usize> {
        let fetched = match &self.remote {
            Some(remote) => match remote.playlist.fetch().await {
                Ok(items) => {
                    let tracks =
                        normalize_remote(items, remote.titles.as_ref(), self.config.unplayable_policy).await;
                    if tracks.is_empty() {
                        Err(PlayerError::RemoteFetchFailure("playlist is empty".to_string()))
                    } else {
                        Ok(tracks)
                    }
                }
                Err(e) => Err(e),
            },
            None => Err(PlayerError::RemoteFetchFailure("no remote playlist configured".to_string())),
        };

        match fetched {
            Ok(tracks) => {
                let video = tracks.iter().filter(|t| t.kind == TrackKind::Video).count();
                let len = tracks.len();
                self.replace_playlist(tracks).await;
                tracing::info!(len, video, "Remote playlist loaded");
                self.ui.notify_success(&format!(
                    "Loaded {} tracks ({} video, {} audio)",
                    len,
                    video,
                    len - video
                ));
                Ok(len)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Remote playlist unavailable, using built-in list");
                self.replace_playlist(self.builtin_tracks()).await;
                self.ui.notify_error(&Self::describe_error(&e, None));
                Err(e)
            }
        }
    }

    /// Installs the stored playlist. Returns false when nothing usable is stored.
    pub async fn load_saved_playlist(&self) -> PlayerResult<bool> {
        let saved = self
            .store
            .load_playlist()
            .map_err(|e| PlayerError::Store(e.to_string()))?;

        match saved {
            Some(tracks) if !tracks.is_empty() => {
                let tracks = tracks
                    .into_iter()
                    .map(|t| apply_policy(t, self.config.unplayable_policy))
                    .collect();
                self.replace_playlist(tracks).await;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn builtin_tracks(&self) -> Vec<Track> {
        builtin_playlist()
            .into_iter()
            .map(|t| apply_policy(t, self.config.unplayable_policy))
            .collect()
    }

    /// Startup sequence: remote playlist if configured, else the stored one,
    /// else the built-in list. Then the last session is restored.
    pub async fn initialize(&self) {
        if self.remote.is_some() {
            let _ = self.load_remote_playlist().await;
        } else {
            match self.load_saved_playlist().await {
                Ok(true) => {}
                Ok(false) => self.replace_playlist(self.builtin_tracks()).await,
                Err(e) => {
                    tracing::warn!(error = %e, "Stored playlist unreadable, using built-in list");
                    self.replace_playlist(self.builtin_tracks()).await;
                }
            }
        }

        if let Err(e) = self.restore_session().await {
            tracing::warn!(error = %e, "Could not restore last session");
        }

        let state = self.state.lock().await;
        self.ui.update_volume(state.volume);
        self.ui.update_modes(state.playlist.shuffle_enabled, state.playlist.repeat_enabled);
    }

    pub async fn save_session(&self) -> PlayerResult<SessionSnapshot> {
        let snapshot = {
            let state = self.state.lock().await;
            let current_time = state
                .active
                .as_ref()
                .and_then(|b| b.current_time())
                .unwrap_or(state.session.current_time_seconds);
            SessionSnapshot {
                current_index: state.playlist.current_index(),
                is_playing: state.session.state == PlayerState::Playing,
                volume: state.volume.level(),
                current_time,
                saved_at: Utc::now(),
            }
        };

        self.store
            .save_session(&snapshot)
            .map_err(|e| PlayerError::Store(e.to_string()))?;
        tracing::debug!(index = snapshot.current_index, "Session saved");
        Ok(snapshot)
    }

    /// Brings back the cursor and volume of the last session. Does not start playback.
    pub async fn restore_session(&self) -> PlayerResult<Option<SessionSnapshot>> {
        let Some(snapshot) = self
            .store
            .load_session()
            .map_err(|e| PlayerError::Store(e.to_string()))?
        else {
            return Ok(None);
        };

        let mut state = self.state.lock().await;
        if state.playlist.select(snapshot.current_index) {
            state.session.track_index = snapshot.current_index;
        }
        state.volume.set(snapshot.volume);
        self.ui.update_volume(state.volume);
        self.ui.render(&state.playlist, state.playlist.current_index());
        tracing::info!(index = snapshot.current_index, saved_at = %snapshot.saved_at, "Session restored");
        Ok(Some(snapshot))
    }
}
