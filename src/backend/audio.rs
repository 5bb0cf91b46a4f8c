//! Direct-Audio adapter

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use super::{BackendEvent, EventSender};
use crate::error::{MediaError, PlayerError, PlayerResult};
use crate::model::is_video_url;

/// A native audio-playback element owned by the embedding environment.
///
/// `load` replaces the current source, starts buffering and resolves once the
/// element can play. The element reports natural end, mid-stream errors and
/// buffering through the sender it received on the latest `load`. A load
/// superseded by a later `load` or `stop` resolves with [`MediaError::Aborted`]
/// and leaves the newer source in place.
#[async_trait]
pub trait AudioElement: Send + Sync {
    async fn load(&self, url: &str, events: EventSender) -> Result<(), MediaError>;
    async fn play(&self) -> Result<(), MediaError>;
    fn pause(&self);
    /// Pause, rewind and drop the source
    fn stop(&self);
    /// Moves the playhead. An element whose source ran out re-queues it first.
    fn seek(&self, seconds: f64) -> Result<(), MediaError>;
    fn set_volume(&self, level: f64);
    fn current_time(&self) -> f64;
    fn duration(&self) -> Option<f64>;
}

/// Orders the loads issued to one element. Only the newest ticket may
/// install its source.
#[derive(Debug, Default)]
pub struct LoadSequence(AtomicU64);

impl LoadSequence {
    /// Takes a ticket for a new load, superseding every earlier one
    pub fn begin(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_latest(&self, ticket: u64) -> bool {
        self.0.load(Ordering::SeqCst) == ticket
    }
}

pub struct DirectAudioAdapter {
    element: Arc<dyn AudioElement>,
    url: String,
    events: Option<EventSender>,
    ready: bool,
}

impl DirectAudioAdapter {
    pub fn new(element: Arc<dyn AudioElement>, url: impl Into<String>) -> Self {
        Self {
            element,
            url: url.into(),
            events: None,
            ready: false,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub(super) async fn load(&mut self, events: EventSender) -> PlayerResult<()> {
        let url = self.url.trim();
        if url.is_empty() || is_video_url(url) {
            return Err(PlayerError::InvalidUrl(self.url.clone()));
        }

        tracing::debug!(url, generation = events.generation(), "Loading audio source");
        self.element.load(url, events.clone()).await?;
        self.events = Some(events);
        self.ready = true;
        Ok(())
    }

    pub(super) async fn play(&mut self) -> PlayerResult<()> {
        if !self.ready {
            return Err(PlayerError::BackendLoadFailure(MediaError::Other(
                "audio source not loaded".to_string(),
            )));
        }
        self.element.play().await?;
        self.emit(BackendEvent::Playing);
        Ok(())
    }

    pub(super) fn pause(&mut self) -> PlayerResult<()> {
        if self.ready {
            self.element.pause();
            self.emit(BackendEvent::Paused);
        }
        Ok(())
    }

    pub(super) fn stop(&mut self) {
        if self.ready {
            self.element.stop();
            self.ready = false;
        }
    }

    pub(super) fn seek(&mut self, seconds: f64) -> PlayerResult<()> {
        if self.ready {
            self.element.seek(seconds)?;
        }
        Ok(())
    }

    pub(super) fn set_volume(&mut self, level: f64) -> PlayerResult<()> {
        self.element.set_volume(level);
        Ok(())
    }

    pub(super) fn current_time(&self) -> Option<f64> {
        self.ready.then(|| self.element.current_time())
    }

    pub(super) fn duration(&self) -> Option<f64> {
        if !self.ready {
            return None;
        }
        self.element.duration().filter(|d| d.is_finite() && *d > 0.0)
    }

    pub(super) fn is_ready(&self) -> bool {
        self.ready
    }

    fn emit(&self, event: BackendEvent) {
        if let Some(events) = &self.events {
            events.emit(event);
        }
    }
}
