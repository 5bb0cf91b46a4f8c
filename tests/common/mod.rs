//! Recording hosts, UI and store shared by the integration tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use tunebox::controller::PlayerEventChannel;
use tunebox::model::{PlaylistStore, SessionSnapshot};
use tunebox::{
    AudioElement, EventSender, IframeHost, LoadSequence, MediaError, PlaybackController, PlayerConfig,
    PlayerHosts, PlayerUi, PlaylistState, Progress, ReadinessGate, Track, TrackDraft, VideoApiHost,
    VideoEventSender, VolumeState,
};

/// Ordered record of every call made to the mocks
#[derive(Clone, Default)]
pub struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }

    pub fn last_position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().rposition(|e| e == entry)
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.position(entry).is_some()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries().iter().filter(|e| *e == entry).count()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

pub struct MockAudio {
    log: Log,
    failing: Mutex<HashSet<String>>,
    delays: Mutex<HashMap<String, Duration>>,
    position: Mutex<(f64, Option<f64>)>,
    events: Mutex<Option<EventSender>>,
    loads: LoadSequence,
    source: Mutex<Option<String>>,
    seek_fails: Mutex<bool>,
}

impl MockAudio {
    pub fn new(log: Log) -> Self {
        Self {
            log,
            failing: Mutex::new(HashSet::new()),
            delays: Mutex::new(HashMap::new()),
            position: Mutex::new((0.0, None)),
            events: Mutex::new(None),
            loads: LoadSequence::default(),
            source: Mutex::new(None),
            seek_fails: Mutex::new(false),
        }
    }

    pub fn fail_on(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string());
    }

    pub fn delay_load(&self, url: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(url.to_string(), delay);
    }

    pub fn set_position(&self, current_time: f64, duration: Option<f64>) {
        *self.position.lock().unwrap() = (current_time, duration);
    }

    /// Seeking fails from now on, as on an element whose source is gone
    pub fn fail_seeks(&self) {
        *self.seek_fails.lock().unwrap() = true;
    }

    /// Url of the source the element currently holds
    pub fn source(&self) -> Option<String> {
        self.source.lock().unwrap().clone()
    }

    /// Sender handed over by the latest successful load
    pub fn events(&self) -> EventSender {
        self.events.lock().unwrap().clone().expect("audio was never loaded")
    }
}

#[async_trait]
impl AudioElement for MockAudio {
    async fn load(&self, url: &str, events: EventSender) -> Result<(), MediaError> {
        self.log.push(format!("audio.load:{}", url));
        let ticket = self.loads.begin();
        let delay = self.delays.lock().unwrap().get(url).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().contains(url) {
            self.log.push(format!("audio.error:{}", url));
            return Err(MediaError::Network);
        }
        if !self.loads.is_latest(ticket) {
            self.log.push(format!("audio.aborted:{}", url));
            return Err(MediaError::Aborted);
        }
        *self.source.lock().unwrap() = Some(url.to_string());
        *self.events.lock().unwrap() = Some(events);
        Ok(())
    }

    async fn play(&self) -> Result<(), MediaError> {
        self.log.push("audio.play");
        Ok(())
    }

    fn pause(&self) {
        self.log.push("audio.pause");
    }

    fn stop(&self) {
        self.log.push("audio.stop");
        self.loads.begin();
        *self.source.lock().unwrap() = None;
    }

    fn seek(&self, seconds: f64) -> Result<(), MediaError> {
        if *self.seek_fails.lock().unwrap() {
            self.log.push("audio.seek-failed");
            return Err(MediaError::Other("source exhausted".to_string()));
        }
        self.log.push(format!("audio.seek:{}", seconds));
        Ok(())
    }

    fn set_volume(&self, level: f64) {
        self.log.push(format!("audio.volume:{}", level));
    }

    fn current_time(&self) -> f64 {
        self.position.lock().unwrap().0
    }

    fn duration(&self) -> Option<f64> {
        self.position.lock().unwrap().1
    }
}

pub struct MockVideo {
    log: Log,
    events: Mutex<Option<VideoEventSender>>,
}

impl MockVideo {
    pub fn new(log: Log) -> Self {
        Self {
            log,
            events: Mutex::new(None),
        }
    }

    pub fn events(&self) -> VideoEventSender {
        self.events.lock().unwrap().clone().expect("video was never loaded")
    }
}

impl VideoApiHost for MockVideo {
    fn load_video_by_id(&self, video_id: &str, events: VideoEventSender) {
        self.log.push(format!("video.load:{}", video_id));
        *self.events.lock().unwrap() = Some(events);
    }
    fn play_video(&self) {
        self.log.push("video.play");
    }
    fn pause_video(&self) {
        self.log.push("video.pause");
    }
    fn stop_video(&self) {
        self.log.push("video.stop");
    }
    fn seek_to(&self, seconds: f64) {
        self.log.push(format!("video.seek:{}", seconds));
    }
    fn set_volume(&self, percent: u8) {
        self.log.push(format!("video.volume:{}", percent));
    }
    fn current_time(&self) -> f64 {
        0.0
    }
    fn duration(&self) -> f64 {
        0.0
    }
}

pub struct MockIframe {
    log: Log,
}

impl IframeHost for MockIframe {
    fn mount(&self, embed_url: &str) -> Result<(), MediaError> {
        self.log.push(format!("iframe.mount:{}", embed_url));
        Ok(())
    }

    fn clear(&self) {
        self.log.push("iframe.clear");
    }
}

#[derive(Default)]
pub struct RecordingUi {
    log: Log,
    pub progress: Mutex<Vec<Progress>>,
    pub errors: Mutex<Vec<String>>,
    pub successes: Mutex<Vec<String>>,
    pub play_states: Mutex<Vec<bool>>,
    pub volumes: Mutex<Vec<VolumeState>>,
    pub modes: Mutex<Vec<(bool, bool)>>,
    pub renders: Mutex<Vec<(usize, usize)>>,
    pub drafts: Mutex<VecDeque<TrackDraft>>,
}

impl RecordingUi {
    pub fn new(log: Log) -> Self {
        Self {
            log,
            ..Default::default()
        }
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn successes(&self) -> Vec<String> {
        self.successes.lock().unwrap().clone()
    }

    pub fn last_progress(&self) -> Option<Progress> {
        self.progress.lock().unwrap().last().copied()
    }

    pub fn queue_draft(&self, draft: TrackDraft) {
        self.drafts.lock().unwrap().push_back(draft);
    }
}

#[async_trait]
impl PlayerUi for RecordingUi {
    fn render(&self, playlist: &PlaylistState, current_index: usize) {
        self.renders.lock().unwrap().push((playlist.len(), current_index));
    }

    fn update_progress(&self, progress: Progress) {
        self.log.push(format!(
            "ui.progress:{}/{}",
            progress.current_time_seconds, progress.duration_seconds
        ));
        self.progress.lock().unwrap().push(progress);
    }

    fn update_play_state(&self, is_playing: bool) {
        self.play_states.lock().unwrap().push(is_playing);
    }

    fn notify_error(&self, message: &str) {
        self.log.push(format!("ui.error:{}", message));
        self.errors.lock().unwrap().push(message.to_string());
    }

    fn notify_success(&self, message: &str) {
        self.successes.lock().unwrap().push(message.to_string());
    }

    async fn prompt_add_track(&self) -> Option<TrackDraft> {
        self.log.push("ui.prompt");
        self.drafts.lock().unwrap().pop_front()
    }

    fn update_volume(&self, volume: VolumeState) {
        self.volumes.lock().unwrap().push(volume);
    }

    fn update_modes(&self, shuffle: bool, repeat: bool) {
        self.modes.lock().unwrap().push((shuffle, repeat));
    }
}

#[derive(Default)]
pub struct MemoryStore {
    pub playlist: Mutex<Option<Vec<Track>>>,
    pub session: Mutex<Option<SessionSnapshot>>,
}

impl PlaylistStore for MemoryStore {
    fn load_playlist(&self) -> Result<Option<Vec<Track>>> {
        Ok(self.playlist.lock().unwrap().clone())
    }

    fn save_playlist(&self, tracks: &[Track]) -> Result<()> {
        *self.playlist.lock().unwrap() = Some(tracks.to_vec());
        Ok(())
    }

    fn load_session(&self) -> Result<Option<SessionSnapshot>> {
        Ok(self.session.lock().unwrap().clone())
    }

    fn save_session(&self, snapshot: &SessionSnapshot) -> Result<()> {
        *self.session.lock().unwrap() = Some(snapshot.clone());
        Ok(())
    }
}

pub struct Harness {
    pub controller: PlaybackController,
    pub channel: PlayerEventChannel,
    pub log: Log,
    pub audio: Arc<MockAudio>,
    pub video: Arc<MockVideo>,
    pub ui: Arc<RecordingUi>,
    pub store: Arc<MemoryStore>,
    pub gate: ReadinessGate,
}

impl Harness {
    pub fn build(config: PlayerConfig) -> Self {
        let log = Log::default();
        let audio = Arc::new(MockAudio::new(log.clone()));
        let video = Arc::new(MockVideo::new(log.clone()));
        let iframe = Arc::new(MockIframe { log: log.clone() });
        let ui = Arc::new(RecordingUi::new(log.clone()));
        let store = Arc::new(MemoryStore::default());
        let gate = ReadinessGate::new(config.readiness_timeout());

        let hosts = PlayerHosts {
            audio: audio.clone(),
            video: video.clone(),
            iframe,
            readiness: gate.clone(),
        };
        let (controller, channel) = PlaybackController::new(config, hosts, ui.clone(), store.clone());

        Self {
            controller,
            channel,
            log,
            audio,
            video,
            ui,
            store,
            gate,
        }
    }

    pub async fn with_tracks(tracks: Vec<Track>) -> Self {
        let harness = Self::build(PlayerConfig::default());
        harness.controller.replace_playlist(tracks).await;
        harness.log.clear();
        harness
    }

    /// Feeds every queued backend event to the controller
    pub async fn pump_events(&mut self) {
        while let Ok(event) = self.channel.try_recv() {
            self.controller.handle_backend_event(event).await;
        }
    }
}

pub fn audio(name: &str) -> Track {
    Track::new(name, "Artist", format!("https://example.com/{}.mp3", name))
}

pub fn video(id: &str) -> Track {
    Track::new(id, "YouTube", format!("https://www.youtube.com/watch?v={}", id))
}

pub fn url(name: &str) -> String {
    format!("https://example.com/{}.mp3", name)
}
