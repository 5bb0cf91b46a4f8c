//! Track descriptor and URL classification

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{PlayerError, PlayerResult};

/// Cover shown when a track has neither an explicit nor a derived cover
pub const PLACEHOLDER_COVER: &str =
    "https://images.unsplash.com/photo-1493225457124-a3eb161ffa5f?w=300&h=300&fit=crop&crop=center";

pub const UNKNOWN_DURATION: &str = "0:00";

static VIDEO_URL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"youtube\.com/watch\?(?:.*&)?v=",
        r"youtu\.be/",
        r"youtube\.com/embed/",
        r"youtube\.com/v/",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static pattern"))
    .collect()
});

// Priority order matters: the first pattern wins.
static VIDEO_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([^&\n?#]+)",
        r"youtube\.com/watch\?(?:.*&)?v=([^&\n?#]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static pattern"))
    .collect()
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    #[serde(alias = "youtube")]
    Video,
}

pub fn classify_url(url: &str) -> TrackKind {
    if VIDEO_URL_PATTERNS.iter().any(|p| p.is_match(url)) {
        TrackKind::Video
    } else {
        TrackKind::Audio
    }
}

pub fn is_video_url(url: &str) -> bool {
    classify_url(url) == TrackKind::Video
}

pub fn extract_video_id(url: &str) -> Option<String> {
    if url.is_empty() {
        return None;
    }
    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|p| p.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Derived cover for a url: the video thumbnail when an id can be extracted
pub fn thumbnail_for(url: &str) -> String {
    match extract_video_id(url) {
        Some(id) if is_video_url(url) => format!("https://img.youtube.com/vi/{}/mqdefault.jpg", id),
        _ => PLACEHOLDER_COVER.to_string(),
    }
}

pub fn embed_url(video_id: &str) -> String {
    format!("https://www.youtube.com/embed/{}?autoplay=1", video_id)
}

pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

/// Parses an `m:ss` hint. Non-numeric hints such as `LIVE` yield `None`.
pub fn parse_duration_hint(hint: &str) -> Option<u64> {
    let (minutes, seconds) = hint.trim().split_once(':')?;
    let minutes: u64 = minutes.parse().ok()?;
    let seconds: u64 = seconds.parse().ok()?;
    Some(minutes * 60 + seconds)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub title: String,
    pub artist: String,
    pub cover_url: String,
    pub source_url: String,
    pub kind: TrackKind,
    #[serde(default)]
    pub fallback_audio_url: Option<String>,
    #[serde(default)]
    pub duration_hint: Option<String>,
    #[serde(default)]
    pub external_view_url: Option<String>,
    #[serde(default = "default_playable")]
    pub playable: bool,
    #[serde(default)]
    pub warning: Option<String>,
}

fn default_playable() -> bool {
    true
}

impl Track {
    /// Builds a track whose kind comes from the shape of `source_url`
    pub fn new(title: impl Into<String>, artist: impl Into<String>, source_url: impl Into<String>) -> Self {
        let source_url = source_url.into();
        let kind = classify_url(&source_url);
        Self {
            title: title.into(),
            artist: artist.into(),
            cover_url: thumbnail_for(&source_url),
            external_view_url: (kind == TrackKind::Video).then(|| source_url.clone()),
            source_url,
            kind,
            fallback_audio_url: None,
            duration_hint: None,
            playable: true,
            warning: None,
        }
    }

    pub fn with_fallback(mut self, url: impl Into<String>) -> Self {
        self.fallback_audio_url = Some(url.into());
        self
    }

    pub fn with_cover(mut self, url: impl Into<String>) -> Self {
        self.cover_url = url.into();
        self
    }

    pub fn with_duration_hint(mut self, hint: impl Into<String>) -> Self {
        self.duration_hint = Some(hint.into());
        self
    }

    /// Declares the kind explicitly. A url that looks like a video stays a video.
    pub fn with_kind(mut self, kind: TrackKind) -> Self {
        self.kind = if is_video_url(&self.source_url) { TrackKind::Video } else { kind };
        self
    }

    pub fn mark_unplayable(mut self, warning: impl Into<String>) -> Self {
        self.playable = false;
        self.warning = Some(warning.into());
        self
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback_audio_url.as_deref().is_some_and(|u| !u.trim().is_empty())
    }

    /// Playable outright, or recoverable through the audio fallback
    pub fn can_attempt(&self) -> bool {
        self.playable || self.has_fallback()
    }

    pub fn video_id(&self) -> Option<String> {
        extract_video_id(&self.source_url)
    }

    pub fn duration_seconds(&self) -> Option<u64> {
        self.duration_hint.as_deref().and_then(parse_duration_hint)
    }

    /// Replaces an unknown hint with the real duration once a backend reports it
    pub fn backfill_duration(&mut self, seconds: f64) -> bool {
        if seconds <= 0.0 || !seconds.is_finite() {
            return false;
        }
        let known = self
            .duration_hint
            .as_deref()
            .is_some_and(|h| h != UNKNOWN_DURATION && parse_duration_hint(h).is_some());
        if known {
            return false;
        }
        self.duration_hint = Some(format_time(seconds));
        true
    }

    pub fn from_draft(draft: TrackDraft) -> PlayerResult<Self> {
        let title = draft.title.trim();
        let url = draft.url.trim();
        if title.is_empty() || url.is_empty() {
            return Err(PlayerError::InvalidUrl(url.to_string()));
        }
        url::Url::parse(url).map_err(|_| PlayerError::InvalidUrl(url.to_string()))?;

        let artist = match draft.artist.trim() {
            "" => "Unknown artist",
            a => a,
        };
        let mut track = Track::new(title, artist, url).with_duration_hint(UNKNOWN_DURATION);
        if let Some(cover) = draft.cover.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            track.cover_url = cover.to_string();
        }
        Ok(track)
    }
}

/// User input collected by the add-track prompt
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackDraft {
    pub title: String,
    pub artist: String,
    pub url: String,
    pub cover: Option<String>,
}
