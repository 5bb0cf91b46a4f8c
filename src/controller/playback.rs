//! Playback control methods

use crate::backend::{Backend, BackendKind, EventSender, Readiness};
use crate::error::{PlayerError, PlayerResult};
use crate::model::{PlaybackSession, PlayerState, Progress, Track, TrackKind};

use super::{ControllerState, PendingLoad, PlaybackController};

impl PlaybackController {
    /// Starts the track at `index` from the beginning.
    ///
    /// Everything up to the backend load happens under one lock: the previous
    /// backend is stopped, the session is replaced and the progress is reset
    /// before any load is issued. Failures of the attempt are reported to the
    /// UI before they are returned.
    pub async fn play_track(&self, index: usize) -> PlayerResult<()> {
        let (generation, track) = {
            let mut state = self.state.lock().await;
            let len = state.playlist.len();
            if !state.playlist.select(index) {
                return Err(PlayerError::IndexOutOfRange { index, len });
            }

            state.cancel_skip_timer();
            state.stop_sync();
            state.stop_active_backend();
            state.pending = None;

            let generation = state.next_generation();
            state.session = PlaybackSession::start(generation, index);
            self.ui.update_progress(Progress::zero());
            self.ui.update_play_state(false);
            self.ui.render(&state.playlist, index);

            let Some(track) = state.playlist.get(index).cloned() else {
                return Err(PlayerError::IndexOutOfRange { index, len });
            };
            tracing::info!(index, generation, title = %track.title, kind = ?track.kind, "Starting track");

            if track.source_url.trim().is_empty() {
                let error = PlayerError::InvalidUrl(String::new());
                return Err(self.fail_attempt(&mut state, &track, error));
            }

            if !track.can_attempt() {
                let error = PlayerError::UnplayableNoFallback {
                    title: track.title.clone(),
                };
                state.session.state = PlayerState::Error;
                self.ui.notify_error(&Self::describe_error(&error, Some(&track)));
                if let Some(target) = state.playlist.find_next_playable(index) {
                    tracing::info!(from = index, to = target, "Scheduling skip to next playable track");
                    self.schedule_skip(&mut state, generation, Some(target));
                }
                return Err(error);
            }

            (generation, track)
        };

        let primary = match self.resolve_backend(&track).await {
            Ok(backend) => self.activate(generation, backend).await,
            Err(e) => Err(e),
        };

        match primary {
            Ok(()) => Ok(()),
            Err(error) => self.recover(generation, &track, error).await,
        }
    }

    /// Picks the primary backend for a track
    async fn resolve_backend(&self, track: &Track) -> PlayerResult<Backend> {
        if track.kind == TrackKind::Audio {
            return Ok(Backend::direct_audio(self.hosts.audio.clone(), &track.source_url));
        }

        let Some(video_id) = track.video_id() else {
            return Err(PlayerError::VideoIdUnavailable(track.source_url.clone()));
        };

        let readiness = match self.hosts.readiness.state() {
            Readiness::Pending => {
                tracing::debug!(video_id = %video_id, "Waiting for video player api");
                self.hosts.readiness.wait().await
            }
            settled => settled,
        };

        match readiness {
            Readiness::Ready => Ok(Backend::video_api(
                self.hosts.video.clone(),
                self.hosts.readiness.clone(),
                video_id,
            )),
            _ if track.has_fallback() => Err(PlayerError::BackendApiUnavailable),
            _ => {
                tracing::info!(video_id = %video_id, "Video player api unavailable, using plain embed");
                Ok(Backend::video_iframe(self.hosts.iframe.clone(), video_id))
            }
        }
    }

    /// Loads and starts `backend` for session `generation`, then makes it the
    /// active one. A result that arrives after the session was replaced is
    /// discarded and reported as success. The session is re-checked between
    /// load and play so a superseded backend never starts.
    async fn activate(&self, generation: u64, mut backend: Backend) -> PlayerResult<()> {
        let kind = backend.kind();
        {
            let mut state = self.state.lock().await;
            if !state.is_current(generation) {
                tracing::debug!(generation, "Session replaced before load, dropping backend");
                return Ok(());
            }
            state.pending = Some(PendingLoad { generation, kind });
        }

        let events = EventSender::new(self.event_sender(), generation, kind);
        let loaded = backend.load(events).await;

        {
            let mut state = self.state.lock().await;
            if !state.is_current(generation) {
                discard_stale(&mut state, backend, generation);
                return Ok(());
            }
            if let Err(e) = loaded {
                clear_pending(&mut state, generation);
                tracing::warn!(generation, kind = ?kind, error = %e, "Backend failed to load");
                backend.stop();
                return Err(e);
            }
            apply_backend_volume(&mut backend, state.volume.effective());
        }

        let played = backend.play().await;

        let mut state = self.state.lock().await;
        if !state.is_current(generation) {
            discard_stale(&mut state, backend, generation);
            return Ok(());
        }
        clear_pending(&mut state, generation);

        if let Err(e) = played {
            tracing::warn!(generation, kind = ?kind, error = %e, "Backend failed to start");
            backend.stop();
            return Err(e);
        }

        tracing::info!(generation, kind = ?kind, "Backend active");
        // Volume may have changed while starting
        apply_backend_volume(&mut backend, state.volume.effective());
        let authoritative = backend.is_authoritative();
        state.active = Some(backend);
        state.session.active_backend_kind = Some(kind);
        state.session.state = PlayerState::Playing;
        self.ui.update_play_state(true);
        if authoritative {
            self.start_sync(&mut state);
        }
        Ok(())
    }

    /// Retries once with the audio fallback, otherwise reports the failure
    pub(crate) async fn recover(&self, generation: u64, track: &Track, error: PlayerError) -> PlayerResult<()> {
        let fallback_url = {
            let mut state = self.state.lock().await;
            if !state.is_current(generation) {
                return Ok(());
            }
            match track.fallback_audio_url.as_deref() {
                Some(url) if error.is_backend_failure() && track.has_fallback() && !state.session.fallback_attempted => {
                    state.session.fallback_attempted = true;
                    Some(url.to_string())
                }
                _ => None,
            }
        };

        let Some(url) = fallback_url else {
            let mut state = self.state.lock().await;
            if !state.is_current(generation) {
                return Ok(());
            }
            return Err(self.fail_attempt(&mut state, track, error));
        };

        tracing::info!(generation, title = %track.title, reason = %error, url = %url, "Retrying with audio fallback");
        let backend = Backend::direct_audio(self.hosts.audio.clone(), url);
        match self.activate(generation, backend).await {
            Ok(()) => Ok(()),
            Err(fallback_error) => {
                let mut state = self.state.lock().await;
                if !state.is_current(generation) {
                    return Ok(());
                }
                Err(self.fail_attempt(&mut state, track, fallback_error))
            }
        }
    }

    /// Terminal failure of the current attempt: notify, then skip ahead if there is anywhere to go
    fn fail_attempt(&self, state: &mut ControllerState, track: &Track, error: PlayerError) -> PlayerError {
        tracing::error!(
            generation = state.session.generation,
            title = %track.title,
            error = %error,
            "Playback failed"
        );
        state.stop_sync();
        state.session.state = PlayerState::Error;
        self.ui.update_play_state(false);
        self.ui.notify_error(&Self::describe_error(&error, Some(track)));
        if state.playlist.len() > 1 {
            let generation = state.session.generation;
            self.schedule_skip(state, generation, None);
        }
        error
    }

    /// Arms the auto-skip timer, replacing any previous one.
    /// `None` advances with `next()`.
    pub(crate) fn schedule_skip(&self, state: &mut ControllerState, generation: u64, target: Option<usize>) {
        state.cancel_skip_timer();
        let controller = self.clone();
        let delay = self.config.skip_delay();
        state.skip_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            controller.run_skip(generation, target).await;
        }));
    }

    async fn run_skip(&self, generation: u64, target: Option<usize>) {
        {
            let mut state = self.state.lock().await;
            if !state.is_current(generation) {
                return;
            }
            // Detach rather than abort: this task is the timer.
            state.skip_timer = None;
        }
        tracing::info!(generation, ?target, "Auto-skipping");
        let result = match target {
            Some(index) => self.play_track(index).await,
            None => self.next().await,
        };
        if let Err(e) = result {
            tracing::debug!(error = %e, "Auto-skip target failed too");
        }
    }

    pub async fn toggle_play(&self) -> PlayerResult<()> {
        let (empty, player_state, has_backend, index) = {
            let state = self.state.lock().await;
            (
                state.playlist.is_empty(),
                state.session.state,
                state.active.is_some(),
                state.playlist.current_index(),
            )
        };

        if empty {
            tracing::debug!("Playlist empty, asking for a track");
            return self.add_track_from_prompt().await;
        }

        match player_state {
            PlayerState::Playing => self.pause().await,
            PlayerState::Paused if has_backend => match self.resume_active(None).await {
                Ok(true) => Ok(()),
                Ok(false) => self.play_track(index).await,
                Err(e) => {
                    tracing::warn!(error = %e, "Resume failed, restarting track");
                    self.play_track(index).await
                }
            },
            _ => self.play_track(index).await,
        }
    }

    pub async fn pause(&self) -> PlayerResult<()> {
        let mut state = self.state.lock().await;
        let Some(backend) = state.active.as_mut() else {
            return Ok(());
        };

        match backend.pause() {
            Ok(()) => {}
            Err(PlayerError::UnsupportedOperation { .. }) => {
                // A bare embed cannot pause; clearing it is the only reliable control.
                tracing::debug!("Backend cannot pause, stopping it");
                state.stop_active_backend();
            }
            Err(e) => return Err(e),
        }

        state.session.state = PlayerState::Paused;
        state.stop_sync();
        self.ui.update_play_state(false);
        tracing::info!(generation = state.session.generation, "Paused");
        Ok(())
    }

    /// Resumes the live backend in place, optionally from `seek_to`.
    /// Returns false when there is no backend that can do it.
    pub(crate) async fn resume_active(&self, seek_to: Option<f64>) -> PlayerResult<bool> {
        let (generation, mut backend) = {
            let mut state = self.state.lock().await;
            match state.active.take() {
                Some(backend) if backend.can_seek() => (state.session.generation, backend),
                other => {
                    state.active = other;
                    return Ok(false);
                }
            }
        };

        let outcome: PlayerResult<()> = async {
            if let Some(seconds) = seek_to {
                backend.seek(seconds)?;
            }
            backend.play().await
        }
        .await;

        let mut state = self.state.lock().await;
        if !state.is_current(generation) {
            discard_stale(&mut state, backend, generation);
            return Ok(true);
        }

        if let Err(e) = outcome {
            backend.stop();
            return Err(e);
        }

        state.active = Some(backend);
        state.session.state = PlayerState::Playing;
        if let Some(seconds) = seek_to {
            state.session.current_time_seconds = seconds;
            self.ui.update_progress(state.session.progress());
        }
        self.ui.update_play_state(true);
        self.start_sync(&mut state);
        tracing::info!(generation, "Resumed");
        Ok(true)
    }

    pub async fn seek(&self, seconds: f64) -> PlayerResult<()> {
        let mut state = self.state.lock().await;
        let result = match state.active.as_mut() {
            Some(backend) => backend.seek(seconds),
            None => return Ok(()),
        };

        match result {
            Ok(()) => {
                let seconds = seconds.max(0.0);
                state.session.current_time_seconds = seconds;
                self.ui.update_progress(state.session.progress());
                Ok(())
            }
            Err(e) => {
                let message = Self::describe_error(&e, state.current_track());
                self.ui.notify_error(&message);
                Err(e)
            }
        }
    }

    /// Seeks to a point of the track given in percent. Needs a known duration.
    pub async fn seek_to_percentage(&self, percentage: f64) -> PlayerResult<()> {
        let duration = {
            let state = self.state.lock().await;
            match state.active.as_ref().and_then(Backend::duration) {
                Some(d) => d,
                None => state.session.duration_seconds,
            }
        };
        if duration <= 0.0 {
            tracing::debug!(percentage, "Duration unknown, ignoring seek");
            return Ok(());
        }
        self.seek(duration * percentage.clamp(0.0, 100.0) / 100.0).await
    }

    /// Stops playback and returns to idle
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        state.reset_session();
        self.ui.update_progress(Progress::zero());
        self.ui.update_play_state(false);
        tracing::info!("Stopped");
    }
}

/// Drops a backend whose session was superseded. It is stopped only when it
/// runs on a host nobody else is using now.
fn discard_stale(state: &mut ControllerState, mut backend: Backend, generation: u64) {
    let kind = backend.kind();
    let active_kind: Option<BackendKind> = state.active.as_ref().map(Backend::kind);
    let pending_kind = state.pending.map(|p| p.kind);
    let shared = active_kind == Some(kind) || pending_kind == Some(kind);
    tracing::debug!(generation, kind = ?kind, shared, "Discarding stale load result");
    if !shared {
        backend.stop();
    }
}

fn clear_pending(state: &mut ControllerState, generation: u64) {
    if state.pending.is_some_and(|p| p.generation == generation) {
        state.pending = None;
    }
}

pub(super) fn apply_backend_volume(backend: &mut Backend, level: f64) {
    match backend.set_volume(level) {
        Ok(()) => {}
        Err(PlayerError::UnsupportedOperation { .. }) => {
            tracing::trace!(kind = ?backend.kind(), "Backend ignores volume");
        }
        Err(e) => tracing::warn!(kind = ?backend.kind(), error = %e, "Could not apply volume"),
    }
}
