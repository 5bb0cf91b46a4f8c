//! Embedded-Video-API adapter and host readiness

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use super::{BackendEvent, EventSender};
use crate::error::{PlayerError, PlayerResult};

// Host player state codes
const STATE_ENDED: i32 = 0;
const STATE_PLAYING: i32 = 1;
const STATE_PAUSED: i32 = 2;
const STATE_BUFFERING: i32 = 3;

/// The embed player object exposed by the video host once its API script is loaded
pub trait VideoApiHost: Send + Sync {
    /// Starts loading and autoplaying `video_id`. State changes and errors are
    /// reported through `events` as raw host codes.
    fn load_video_by_id(&self, video_id: &str, events: VideoEventSender);
    fn play_video(&self);
    fn pause_video(&self);
    fn stop_video(&self);
    fn seek_to(&self, seconds: f64);
    fn set_volume(&self, percent: u8);
    fn current_time(&self) -> f64;
    fn duration(&self) -> f64;
}

/// Maps host error codes to domain reasons
pub fn map_video_error(code: i32) -> PlayerError {
    match code {
        2 => PlayerError::VideoInvalidId,
        5 => PlayerError::NotHtml5Playable,
        100 => PlayerError::VideoRemoved,
        101 | 150 => PlayerError::VideoRestricted,
        other => PlayerError::BackendLoadFailure(crate::error::MediaError::Other(format!(
            "video player error {}",
            other
        ))),
    }
}

/// Translates raw host callbacks into backend events
#[derive(Clone, Debug)]
pub struct VideoEventSender {
    inner: EventSender,
}

impl VideoEventSender {
    pub fn new(inner: EventSender) -> Self {
        Self { inner }
    }

    pub fn state_changed(&self, code: i32) {
        let event = match code {
            STATE_PLAYING => BackendEvent::Playing,
            STATE_PAUSED => BackendEvent::Paused,
            STATE_ENDED => BackendEvent::Ended,
            STATE_BUFFERING => BackendEvent::Buffering,
            other => {
                tracing::trace!(code = other, "Ignoring video player state");
                return;
            }
        };
        self.inner.emit(event);
    }

    pub fn error(&self, code: i32) {
        tracing::warn!(code, "Video player reported an error");
        self.inner.emit(BackendEvent::Error(map_video_error(code)));
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Readiness {
    Pending,
    Ready,
    Unavailable,
}

/// One-shot readiness of the video host API.
///
/// Leaves `Pending` exactly once, either when the host fires its ready callback
/// or when its script fails to load. Waiting past the deadline resolves to
/// `Unavailable`.
#[derive(Clone)]
pub struct ReadinessGate {
    state: Arc<watch::Sender<Readiness>>,
    deadline: Instant,
}

impl ReadinessGate {
    pub fn new(timeout: Duration) -> Self {
        let (tx, _rx) = watch::channel(Readiness::Pending);
        Self {
            state: Arc::new(tx),
            deadline: Instant::now() + timeout,
        }
    }

    pub fn state(&self) -> Readiness {
        *self.state.borrow()
    }

    /// Host ready callback. Returns false if the gate had already settled.
    pub fn mark_ready(&self) -> bool {
        self.settle(Readiness::Ready)
    }

    /// Host script failed to load or initialize
    pub fn mark_unavailable(&self) -> bool {
        self.settle(Readiness::Unavailable)
    }

    fn settle(&self, outcome: Readiness) -> bool {
        let changed = self.state.send_if_modified(|state| {
            if *state == Readiness::Pending {
                *state = outcome;
                true
            } else {
                false
            }
        });
        if changed {
            tracing::info!(?outcome, "Video player api settled");
        }
        changed
    }

    /// Waits until the gate settles or the deadline passes
    pub async fn wait(&self) -> Readiness {
        let mut rx = self.state.subscribe();
        let settled = tokio::time::timeout_at(self.deadline, async {
            rx.wait_for(|s| *s != Readiness::Pending).await.map(|s| *s)
        })
        .await;

        match settled {
            Ok(Ok(state)) => state,
            Ok(Err(_)) => self.state(),
            Err(_) => {
                tracing::warn!("Video player api did not become ready in time");
                self.mark_unavailable();
                self.state()
            }
        }
    }
}

pub struct VideoApiAdapter {
    host: Arc<dyn VideoApiHost>,
    gate: ReadinessGate,
    video_id: String,
    events: Option<EventSender>,
    loaded: bool,
}

impl VideoApiAdapter {
    pub fn new(host: Arc<dyn VideoApiHost>, gate: ReadinessGate, video_id: impl Into<String>) -> Self {
        Self {
            host,
            gate,
            video_id: video_id.into(),
            events: None,
            loaded: false,
        }
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub(super) fn load(&mut self, events: EventSender) -> PlayerResult<()> {
        if self.gate.state() != Readiness::Ready {
            return Err(PlayerError::BackendApiUnavailable);
        }
        tracing::debug!(video_id = %self.video_id, generation = events.generation(), "Loading video by id");
        self.host
            .load_video_by_id(&self.video_id, VideoEventSender::new(events.clone()));
        self.events = Some(events);
        self.loaded = true;
        Ok(())
    }

    pub(super) fn play(&mut self) -> PlayerResult<()> {
        if !self.loaded {
            return Err(PlayerError::BackendApiUnavailable);
        }
        self.host.play_video();
        Ok(())
    }

    pub(super) fn pause(&mut self) -> PlayerResult<()> {
        if self.loaded {
            self.host.pause_video();
        }
        Ok(())
    }

    pub(super) fn stop(&mut self) {
        if self.loaded {
            self.host.stop_video();
            self.loaded = false;
        }
    }

    pub(super) fn seek(&mut self, seconds: f64) -> PlayerResult<()> {
        if self.loaded {
            self.host.seek_to(seconds);
        }
        Ok(())
    }

    pub(super) fn set_volume(&mut self, level: f64) -> PlayerResult<()> {
        if self.gate.state() == Readiness::Ready {
            self.host.set_volume((level * 100.0).round() as u8);
        }
        Ok(())
    }

    pub(super) fn current_time(&self) -> Option<f64> {
        self.loaded.then(|| self.host.current_time())
    }

    pub(super) fn duration(&self) -> Option<f64> {
        if !self.loaded {
            return None;
        }
        Some(self.host.duration()).filter(|d| d.is_finite() && *d > 0.0)
    }

    pub(super) fn is_ready(&self) -> bool {
        self.gate.state() == Readiness::Ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendKind, TaggedEvent};
    use tokio::sync::mpsc;

    #[test]
    fn error_codes_map_to_reasons() {
        assert_eq!(map_video_error(2), PlayerError::VideoInvalidId);
        assert_eq!(map_video_error(5), PlayerError::NotHtml5Playable);
        assert_eq!(map_video_error(100), PlayerError::VideoRemoved);
        assert_eq!(map_video_error(101), PlayerError::VideoRestricted);
        assert_eq!(map_video_error(150), PlayerError::VideoRestricted);
        assert!(matches!(map_video_error(7), PlayerError::BackendLoadFailure(_)));
    }

    #[test]
    fn state_codes_become_events() {
        let (tx, mut rx) = mpsc::unbounded_channel::<TaggedEvent>();
        let sender = VideoEventSender::new(EventSender::new(tx, 3, BackendKind::VideoApi));
        for code in [1, 2, 3, 0, -1, 5] {
            sender.state_changed(code);
        }
        sender.error(150);

        let events: Vec<BackendEvent> = std::iter::from_fn(|| rx.try_recv().ok()).map(|e| e.event).collect();
        assert_eq!(
            events,
            vec![
                BackendEvent::Playing,
                BackendEvent::Paused,
                BackendEvent::Buffering,
                BackendEvent::Ended,
                BackendEvent::Error(PlayerError::VideoRestricted),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn readiness_is_monotonic() {
        let gate = ReadinessGate::new(Duration::from_secs(10));
        assert_eq!(gate.state(), Readiness::Pending);
        assert!(gate.mark_ready());
        assert!(!gate.mark_unavailable());
        assert!(!gate.mark_ready());
        assert_eq!(gate.wait().await, Readiness::Ready);
        assert_eq!(gate.state(), Readiness::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn readiness_times_out_to_unavailable() {
        let gate = ReadinessGate::new(Duration::from_secs(10));
        let started = Instant::now();
        assert_eq!(gate.wait().await, Readiness::Unavailable);
        assert!(started.elapsed() >= Duration::from_secs(10));
        // A late ready callback cannot revive it
        assert!(!gate.mark_ready());
        assert_eq!(gate.state(), Readiness::Unavailable);
    }

    #[tokio::test(start_paused = true)]
    async fn waiter_wakes_when_host_becomes_ready() {
        let gate = ReadinessGate::new(Duration::from_secs(10));
        let host_side = gate.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            host_side.mark_ready();
        });
        assert_eq!(gate.wait().await, Readiness::Ready);
    }
}
