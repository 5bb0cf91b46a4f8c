//! Controller module - Playback orchestration
//!
//! The controller owns the playlist, the playback session and the single
//! active backend slot. Everything that reacts to the user or to a backend
//! goes through it. It is organized into submodules by responsibility:
//!
//! - `playback`: track start, backend resolution, fallback, play/pause/seek/stop
//! - `navigation`: next/previous/ended, shuffle/repeat, playlist editing and loading
//! - `volume`: volume and mute
//! - `progress`: the shared progress polling loop
//! - `player_events`: backend event listener
//! - `input`: key handling for the terminal front end

mod input;
mod navigation;
mod playback;
mod player_events;
mod progress;
mod volume;

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::backend::{
    AudioElement, Backend, BackendKind, IframeHost, ReadinessGate, TaggedEvent, VideoApiHost,
};
use crate::config::PlayerConfig;
use crate::error::PlayerError;
use crate::model::{
    PlaybackSession, PlaylistSource, PlaylistState, PlaylistStore, TitleLookup, Track, VolumeState,
};
use crate::view::PlayerUi;

pub use input::KeyOutcome;

/// Receiving end of the backend event stream, consumed by the event listener
pub type PlayerEventChannel = UnboundedReceiver<TaggedEvent>;

/// Host capabilities the adapters are built on
#[derive(Clone)]
pub struct PlayerHosts {
    pub audio: Arc<dyn AudioElement>,
    pub video: Arc<dyn VideoApiHost>,
    pub iframe: Arc<dyn IframeHost>,
    pub readiness: ReadinessGate,
}

#[derive(Clone)]
pub(crate) struct RemoteSources {
    pub(crate) playlist: Arc<dyn PlaylistSource>,
    pub(crate) titles: Arc<dyn TitleLookup>,
}

/// A load that has been issued but has not resolved yet
#[derive(Clone, Copy, Debug)]
pub(crate) struct PendingLoad {
    pub(crate) generation: u64,
    pub(crate) kind: BackendKind,
}

pub(crate) struct ControllerState {
    pub(crate) playlist: PlaylistState,
    pub(crate) session: PlaybackSession,
    pub(crate) volume: VolumeState,
    pub(crate) active: Option<Backend>,
    pub(crate) pending: Option<PendingLoad>,
    pub(crate) skip_timer: Option<JoinHandle<()>>,
    pub(crate) sync_task: Option<JoinHandle<()>>,
    last_generation: u64,
}

impl ControllerState {
    fn new(volume: VolumeState) -> Self {
        Self {
            playlist: PlaylistState::default(),
            session: PlaybackSession::idle(),
            volume,
            active: None,
            pending: None,
            skip_timer: None,
            sync_task: None,
            last_generation: 0,
        }
    }

    pub(crate) fn next_generation(&mut self) -> u64 {
        self.last_generation += 1;
        self.last_generation
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.session.generation == generation
    }

    pub(crate) fn cancel_skip_timer(&mut self) {
        if let Some(timer) = self.skip_timer.take() {
            timer.abort();
        }
    }

    pub(crate) fn stop_sync(&mut self) {
        if let Some(task) = self.sync_task.take() {
            task.abort();
        }
    }

    /// Stops and releases the active backend. Idempotent.
    pub(crate) fn stop_active_backend(&mut self) {
        if let Some(mut backend) = self.active.take() {
            tracing::debug!(kind = ?backend.kind(), "Stopping active backend");
            backend.stop();
        }
    }

    /// Ends the current session without starting a new one
    pub(crate) fn reset_session(&mut self) {
        self.cancel_skip_timer();
        self.stop_sync();
        self.stop_active_backend();
        self.pending = None;
        let generation = self.next_generation();
        self.session = PlaybackSession {
            generation,
            track_index: self.playlist.current_index(),
            ..PlaybackSession::idle()
        };
    }

    pub(crate) fn current_track(&self) -> Option<&Track> {
        self.playlist.get(self.session.track_index)
    }
}

#[derive(Clone)]
pub struct PlaybackController {
    pub(crate) state: Arc<Mutex<ControllerState>>,
    pub(crate) hosts: PlayerHosts,
    pub(crate) ui: Arc<dyn PlayerUi>,
    pub(crate) store: Arc<dyn PlaylistStore>,
    pub(crate) config: Arc<PlayerConfig>,
    pub(crate) remote: Option<RemoteSources>,
    events: UnboundedSender<TaggedEvent>,
}

impl PlaybackController {
    /// Creates the controller and the event channel its backends report on.
    /// Pass the channel to [`PlaybackController::start_player_event_listener`].
    pub fn new(
        config: PlayerConfig,
        hosts: PlayerHosts,
        ui: Arc<dyn PlayerUi>,
        store: Arc<dyn PlaylistStore>,
    ) -> (Self, PlayerEventChannel) {
        let (events, channel) = mpsc::unbounded_channel();
        let volume = VolumeState::new(config.default_volume);
        let controller = Self {
            state: Arc::new(Mutex::new(ControllerState::new(volume))),
            hosts,
            ui,
            store,
            config: Arc::new(config),
            remote: None,
            events,
        };
        (controller, channel)
    }

    pub fn with_playlist_source(
        mut self,
        playlist: Arc<dyn PlaylistSource>,
        titles: Arc<dyn TitleLookup>,
    ) -> Self {
        self.remote = Some(RemoteSources { playlist, titles });
        self
    }

    /// Current playback session
    pub async fn snapshot(&self) -> PlaybackSession {
        self.state.lock().await.session.clone()
    }

    pub async fn playlist(&self) -> PlaylistState {
        self.state.lock().await.playlist.clone()
    }

    pub async fn volume(&self) -> VolumeState {
        self.state.lock().await.volume
    }

    pub(crate) fn event_sender(&self) -> UnboundedSender<TaggedEvent> {
        self.events.clone()
    }

    pub(crate) fn persist_playlist(&self, playlist: &PlaylistState) {
        if let Err(e) = self.store.save_playlist(playlist.tracks()) {
            tracing::warn!(error = %e, "Could not persist playlist");
        }
    }

    /// Human-readable reason for a toast
    pub fn describe_error(error: &PlayerError, track: Option<&Track>) -> String {
        let title = track.map(|t| t.title.as_str()).unwrap_or("this track");
        match error {
            PlayerError::InvalidUrl(url) if url.is_empty() => format!("\"{}\" has no source url", title),
            PlayerError::InvalidUrl(url) => format!("Invalid url: {}", url),
            PlayerError::UnplayableNoFallback { title } => {
                format!("\"{}\" cannot be played here and has no audio fallback. Skipping.", title)
            }
            PlayerError::BackendLoadFailure(reason) => format!("Could not play \"{}\": {}", title, reason),
            PlayerError::BackendApiUnavailable => {
                format!("Video player is not available for \"{}\"", title)
            }
            PlayerError::VideoRestricted => {
                format!("Video \"{}\": the owner does not allow embedded playback", title)
            }
            PlayerError::VideoRemoved => format!("Video \"{}\" does not exist or was removed", title),
            PlayerError::VideoInvalidId => format!("Video \"{}\": invalid video id", title),
            PlayerError::NotHtml5Playable => {
                format!("Video \"{}\" cannot be played by the html5 player", title)
            }
            PlayerError::VideoIdUnavailable(_) => format!("Cannot read a video id from \"{}\"", title),
            PlayerError::RemoteFetchFailure(_) => {
                "Could not load the online playlist, using the built-in one".to_string()
            }
            PlayerError::UnsupportedOperation { operation, .. } => {
                format!("{} is not available for embedded videos", operation.replace('_', " "))
            }
            PlayerError::IndexOutOfRange { index, .. } => format!("There is no track {}", index + 1),
            PlayerError::Store(e) => format!("Storage error: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MediaError;

    #[test]
    fn describe_error_names_the_track() {
        let track = Track::new("Lofi", "Beats", "https://www.youtube.com/watch?v=abc");
        let message = PlaybackController::describe_error(&PlayerError::VideoRestricted, Some(&track));
        assert!(message.contains("Lofi"));
        assert!(message.contains("embedded"));

        let message = PlaybackController::describe_error(
            &PlayerError::BackendLoadFailure(MediaError::Network),
            None,
        );
        assert!(message.contains("this track"));
        assert!(message.contains("network"));
    }

    #[test]
    fn describe_error_for_unsupported_operation() {
        let message = PlaybackController::describe_error(
            &PlayerError::UnsupportedOperation {
                backend: BackendKind::VideoIframe,
                operation: "set_volume",
            },
            None,
        );
        assert_eq!(message, "set volume is not available for embedded videos");
    }
}
