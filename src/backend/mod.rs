//! Playback backends
//!
//! Three technologies can play a track: a native audio element, an embedded
//! video player driven through its host API, and a bare autoplay iframe. Each
//! is wrapped in an adapter and the adapters are unified by [`Backend`], so the
//! controller and the progress loop only ever see one control surface.
//!
//! - `audio`: Direct-Audio adapter over an [`AudioElement`]
//! - `video_api`: Embedded-Video-API adapter, host readiness gate, error code mapping
//! - `iframe`: degraded iframe adapter; only `stop` is reliable

mod audio;
mod iframe;
mod video_api;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use crate::error::{PlayerError, PlayerResult};

pub use audio::{AudioElement, DirectAudioAdapter, LoadSequence};
pub use iframe::{IframeHost, VideoIframeAdapter};
pub use video_api::{
    map_video_error, Readiness, ReadinessGate, VideoApiAdapter, VideoApiHost, VideoEventSender,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum BackendKind {
    DirectAudio,
    VideoApi,
    VideoIframe,
}

/// Backend-agnostic state transitions
#[derive(Clone, Debug, PartialEq)]
pub enum BackendEvent {
    Playing,
    Paused,
    Ended,
    Buffering,
    Error(PlayerError),
}

/// An event stamped with the session it belongs to
#[derive(Clone, Debug, PartialEq)]
pub struct TaggedEvent {
    pub generation: u64,
    pub kind: BackendKind,
    pub event: BackendEvent,
}

/// Handed to a backend on load; every event it emits carries the load's generation
#[derive(Clone, Debug)]
pub struct EventSender {
    tx: UnboundedSender<TaggedEvent>,
    generation: u64,
    kind: BackendKind,
}

impl EventSender {
    pub fn new(tx: UnboundedSender<TaggedEvent>, generation: u64, kind: BackendKind) -> Self {
        Self { tx, generation, kind }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn emit(&self, event: BackendEvent) {
        let tagged = TaggedEvent {
            generation: self.generation,
            kind: self.kind,
            event,
        };
        if self.tx.send(tagged).is_err() {
            tracing::trace!(generation = self.generation, "Event listener gone, dropping backend event");
        }
    }
}

/// One playback technology bound to one source
pub enum Backend {
    DirectAudio(DirectAudioAdapter),
    VideoApi(VideoApiAdapter),
    VideoIframe(VideoIframeAdapter),
}

impl Backend {
    pub fn direct_audio(element: Arc<dyn AudioElement>, url: impl Into<String>) -> Self {
        Backend::DirectAudio(DirectAudioAdapter::new(element, url))
    }

    pub fn video_api(host: Arc<dyn VideoApiHost>, gate: ReadinessGate, video_id: impl Into<String>) -> Self {
        Backend::VideoApi(VideoApiAdapter::new(host, gate, video_id))
    }

    pub fn video_iframe(host: Arc<dyn IframeHost>, video_id: impl Into<String>) -> Self {
        Backend::VideoIframe(VideoIframeAdapter::new(host, video_id))
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::DirectAudio(_) => BackendKind::DirectAudio,
            Backend::VideoApi(_) => BackendKind::VideoApi,
            Backend::VideoIframe(_) => BackendKind::VideoIframe,
        }
    }

    /// Whether time and duration reported by this backend can be trusted
    pub fn is_authoritative(&self) -> bool {
        !matches!(self, Backend::VideoIframe(_))
    }

    pub fn can_seek(&self) -> bool {
        !matches!(self, Backend::VideoIframe(_))
    }

    pub async fn load(&mut self, events: EventSender) -> PlayerResult<()> {
        match self {
            Backend::DirectAudio(a) => a.load(events).await,
            Backend::VideoApi(a) => a.load(events),
            Backend::VideoIframe(a) => a.load(),
        }
    }

    pub async fn play(&mut self) -> PlayerResult<()> {
        match self {
            Backend::DirectAudio(a) => a.play().await,
            Backend::VideoApi(a) => a.play(),
            Backend::VideoIframe(a) => a.play(),
        }
    }

    pub fn pause(&mut self) -> PlayerResult<()> {
        match self {
            Backend::DirectAudio(a) => a.pause(),
            Backend::VideoApi(a) => a.pause(),
            Backend::VideoIframe(_) => Err(iframe_unsupported("pause")),
        }
    }

    /// Idempotent
    pub fn stop(&mut self) {
        match self {
            Backend::DirectAudio(a) => a.stop(),
            Backend::VideoApi(a) => a.stop(),
            Backend::VideoIframe(a) => a.stop(),
        }
    }

    pub fn seek(&mut self, seconds: f64) -> PlayerResult<()> {
        let seconds = seconds.max(0.0);
        match self {
            Backend::DirectAudio(a) => a.seek(seconds),
            Backend::VideoApi(a) => a.seek(seconds),
            Backend::VideoIframe(_) => Err(iframe_unsupported("seek")),
        }
    }

    pub fn set_volume(&mut self, level: f64) -> PlayerResult<()> {
        let level = level.clamp(0.0, 1.0);
        match self {
            Backend::DirectAudio(a) => a.set_volume(level),
            Backend::VideoApi(a) => a.set_volume(level),
            Backend::VideoIframe(_) => Err(iframe_unsupported("set_volume")),
        }
    }

    pub fn current_time(&self) -> Option<f64> {
        match self {
            Backend::DirectAudio(a) => a.current_time(),
            Backend::VideoApi(a) => a.current_time(),
            Backend::VideoIframe(_) => None,
        }
    }

    pub fn duration(&self) -> Option<f64> {
        match self {
            Backend::DirectAudio(a) => a.duration(),
            Backend::VideoApi(a) => a.duration(),
            Backend::VideoIframe(_) => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        match self {
            Backend::DirectAudio(a) => a.is_ready(),
            Backend::VideoApi(a) => a.is_ready(),
            Backend::VideoIframe(_) => true,
        }
    }
}

fn iframe_unsupported(operation: &'static str) -> PlayerError {
    PlayerError::UnsupportedOperation {
        backend: BackendKind::VideoIframe,
        operation,
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("kind", &self.kind())
            .field("ready", &self.is_ready())
            .finish()
    }
}
