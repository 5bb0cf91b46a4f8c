//! Terminal host capabilities
//!
//! Native audio output through rodio, and the video hosts a terminal can
//! offer, which is none: the video api reports unavailable and there is no
//! surface to mount an embed on.

use std::io::Cursor;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use rodio::{decoder::DecoderError, Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use tokio::task::JoinHandle;

use crate::backend::{
    AudioElement, BackendEvent, EventSender, IframeHost, LoadSequence, VideoApiHost, VideoEventSender,
};
use crate::error::MediaError;

const END_POLL_INTERVAL: Duration = Duration::from_millis(250);

type AudioBytes = Arc<[u8]>;

struct LoadedSource {
    sink: Arc<Sink>,
    bytes: AudioBytes,
    duration: Option<Duration>,
    events: EventSender,
    end_watcher: JoinHandle<()>,
}

impl LoadedSource {
    /// Queues the decoded source again once a full pass drained the sink.
    /// Returns whether it did.
    fn requeue_if_drained(&mut self) -> Result<bool, MediaError> {
        if !self.sink.empty() {
            return Ok(false);
        }
        append_source(&self.sink, &self.bytes)?;
        self.end_watcher.abort();
        self.end_watcher = watch_end(self.sink.clone(), self.events.clone());
        tracing::debug!("Audio source re-queued after end");
        Ok(true)
    }

    fn release(self) {
        self.end_watcher.abort();
        self.sink.stop();
    }
}

fn decode(bytes: &AudioBytes) -> Result<Decoder<Cursor<AudioBytes>>, MediaError> {
    Decoder::new(Cursor::new(bytes.clone())).map_err(|e| match e {
        DecoderError::UnrecognizedFormat => MediaError::SourceNotSupported,
        other => {
            tracing::warn!(error = %other, "Audio decode failed");
            MediaError::Decode
        }
    })
}

fn append_source(sink: &Sink, bytes: &AudioBytes) -> Result<Option<Duration>, MediaError> {
    let source = decode(bytes)?;
    let duration = source.total_duration();
    sink.append(source);
    Ok(duration)
}

fn watch_end(sink: Arc<Sink>, events: EventSender) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(END_POLL_INTERVAL);
        loop {
            ticker.tick().await;
            if sink.empty() {
                events.emit(BackendEvent::Ended);
                break;
            }
        }
    })
}

/// Audio element backed by the default output device.
///
/// The output stream is not `Send`, so it lives on its own thread for the life
/// of the process and only its handle is kept here.
pub struct NativeAudioElement {
    handle: OutputStreamHandle,
    client: reqwest::Client,
    loads: LoadSequence,
    loaded: Mutex<Option<LoadedSource>>,
    volume: Mutex<f32>,
}

impl NativeAudioElement {
    pub fn open(client: reqwest::Client) -> Result<Self> {
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || match OutputStream::try_default() {
                Ok((stream, handle)) => {
                    let _stream = stream;
                    if tx.send(Ok(handle)).is_ok() {
                        loop {
                            std::thread::park();
                        }
                    }
                }
                Err(e) => {
                    let _ = tx.send(Err(e.to_string()));
                }
            })?;

        let handle = rx.recv()?.map_err(anyhow::Error::msg)?;
        tracing::info!("Audio output opened");

        Ok(Self {
            handle,
            client,
            loads: LoadSequence::default(),
            loaded: Mutex::new(None),
            volume: Mutex::new(1.0),
        })
    }

    fn loaded(&self) -> MutexGuard<'_, Option<LoadedSource>> {
        self.loaded.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, MediaError> {
        if url.starts_with("http://") || url.starts_with("https://") {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| {
                    tracing::warn!(url, error = %e, "Audio fetch failed");
                    MediaError::Network
                })?;
            let bytes = response.bytes().await.map_err(|_| MediaError::Network)?;
            return Ok(bytes.to_vec());
        }

        let path = url.strip_prefix("file://").unwrap_or(url);
        tokio::fs::read(path).await.map_err(|e| {
            tracing::warn!(path, error = %e, "Audio file unreadable");
            MediaError::Other(e.to_string())
        })
    }

    fn release(&self) {
        if let Some(previous) = self.loaded().take() {
            previous.release();
        }
    }
}

#[async_trait]
impl AudioElement for NativeAudioElement {
    async fn load(&self, url: &str, events: EventSender) -> Result<(), MediaError> {
        let ticket = self.loads.begin();
        self.release();
        let bytes: AudioBytes = self.fetch(url).await?.into();

        let sink = Sink::try_new(&self.handle).map_err(|e| MediaError::Other(e.to_string()))?;
        sink.pause();
        sink.set_volume(*self.volume.lock().unwrap_or_else(|e| e.into_inner()));
        let duration = append_source(&sink, &bytes).inspect_err(|e| {
            tracing::debug!(url, error = %e, "Audio source rejected");
        })?;
        let sink = Arc::new(sink);

        let mut loaded = self.loaded();
        if !self.loads.is_latest(ticket) {
            tracing::debug!(url, "Audio load superseded, dropping its source");
            sink.stop();
            return Err(MediaError::Aborted);
        }
        let end_watcher = watch_end(sink.clone(), events.clone());
        let source = LoadedSource {
            sink,
            bytes,
            duration,
            events,
            end_watcher,
        };
        if let Some(previous) = loaded.replace(source) {
            previous.release();
        }
        tracing::debug!(url, duration = ?duration, "Audio source ready");
        Ok(())
    }

    async fn play(&self) -> Result<(), MediaError> {
        match self.loaded().as_mut() {
            Some(loaded) => {
                loaded.requeue_if_drained()?;
                loaded.sink.play();
                Ok(())
            }
            None => Err(MediaError::Aborted),
        }
    }

    fn pause(&self) {
        if let Some(loaded) = self.loaded().as_ref() {
            loaded.sink.pause();
        }
    }

    fn stop(&self) {
        // Also aborts a load still in flight
        self.loads.begin();
        self.release();
    }

    fn seek(&self, seconds: f64) -> Result<(), MediaError> {
        let mut guard = self.loaded();
        let Some(loaded) = guard.as_mut() else {
            return Err(MediaError::Aborted);
        };
        // A re-queued source already starts at zero
        if loaded.requeue_if_drained()? && seconds <= 0.0 {
            return Ok(());
        }
        loaded
            .sink
            .try_seek(Duration::from_secs_f64(seconds.max(0.0)))
            .map_err(|e| {
                tracing::warn!(seconds, error = %e, "Seek failed");
                MediaError::Other(e.to_string())
            })
    }

    fn set_volume(&self, level: f64) {
        let level = level.clamp(0.0, 1.0) as f32;
        *self.volume.lock().unwrap_or_else(|e| e.into_inner()) = level;
        if let Some(loaded) = self.loaded().as_ref() {
            loaded.sink.set_volume(level);
        }
    }

    fn current_time(&self) -> f64 {
        self.loaded()
            .as_ref()
            .map(|l| l.sink.get_pos().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn duration(&self) -> Option<f64> {
        self.loaded()
            .as_ref()
            .and_then(|l| l.duration)
            .map(|d| d.as_secs_f64())
    }
}

/// A terminal cannot host the embedded video player
pub struct UnavailableVideoHost;

impl VideoApiHost for UnavailableVideoHost {
    fn load_video_by_id(&self, video_id: &str, _events: VideoEventSender) {
        tracing::warn!(video_id, "Video load requested without a video player");
    }
    fn play_video(&self) {}
    fn pause_video(&self) {}
    fn stop_video(&self) {}
    fn seek_to(&self, _seconds: f64) {}
    fn set_volume(&self, _percent: u8) {}
    fn current_time(&self) -> f64 {
        0.0
    }
    fn duration(&self) -> f64 {
        0.0
    }
}

/// Nowhere to mount an embed in a terminal
pub struct NoEmbedSurface;

impl IframeHost for NoEmbedSurface {
    fn mount(&self, embed_url: &str) -> Result<(), MediaError> {
        tracing::debug!(embed_url, "Cannot mount embed in a terminal");
        Err(MediaError::SourceNotSupported)
    }

    fn clear(&self) {}
}
