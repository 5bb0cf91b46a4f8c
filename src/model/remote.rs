//! Remote playlist descriptors, title lookup and the built-in fallback list

use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;

use crate::config::UnplayablePolicy;
use crate::error::{PlayerError, PlayerResult};
use super::track::{
    extract_video_id, thumbnail_for, Track, TrackKind, PLACEHOLDER_COVER, UNKNOWN_DURATION,
};

/// One entry of the remote playlist JSON array
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<TrackKind>,
    #[serde(default)]
    pub audio_fallback: Option<String>,
}

#[async_trait]
pub trait PlaylistSource: Send + Sync {
    async fn fetch(&self) -> PlayerResult<Vec<RemoteItem>>;
}

#[async_trait]
pub trait TitleLookup: Send + Sync {
    async fn lookup_title(&self, video_id: &str) -> Option<String>;
}

/// Fetches the playlist JSON over HTTP
pub struct HttpPlaylistSource {
    client: reqwest::Client,
    url: String,
}

impl HttpPlaylistSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self { client, url: url.into() }
    }
}

#[async_trait]
impl PlaylistSource for HttpPlaylistSource {
    async fn fetch(&self) -> PlayerResult<Vec<RemoteItem>> {
        tracing::debug!(url = %self.url, "Fetching remote playlist");
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| PlayerError::RemoteFetchFailure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlayerError::RemoteFetchFailure(format!("HTTP {}", status)));
        }

        response
            .json::<Vec<RemoteItem>>()
            .await
            .map_err(|e| PlayerError::RemoteFetchFailure(e.to_string()))
    }
}

#[derive(Deserialize)]
struct OEmbedResponse {
    title: String,
}

/// Title lookup through the public oEmbed endpoint, no API key needed
pub struct OEmbedTitleLookup {
    client: reqwest::Client,
}

impl OEmbedTitleLookup {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TitleLookup for OEmbedTitleLookup {
    async fn lookup_title(&self, video_id: &str) -> Option<String> {
        let watch_url = format!("https://www.youtube.com/watch?v={}", video_id);
        let result = self
            .client
            .get("https://www.youtube.com/oembed")
            .query(&[("url", watch_url.as_str()), ("format", "json")])
            .send()
            .await
            .and_then(|r| r.error_for_status());

        match result {
            Ok(response) => response.json::<OEmbedResponse>().await.ok().map(|r| r.title),
            Err(e) => {
                tracing::warn!(video_id, error = %e, "Could not fetch video title");
                None
            }
        }
    }
}

/// Turns remote descriptors into tracks. Items without a url are dropped.
pub async fn normalize_remote(
    items: Vec<RemoteItem>,
    lookup: &dyn TitleLookup,
    policy: UnplayablePolicy,
) -> Vec<Track> {
    let futures = items
        .into_iter()
        .enumerate()
        .filter(|(_, item)| !item.url.trim().is_empty())
        .map(|(position, item)| normalize_item(position, item, lookup, policy));

    join_all(futures).await
}

async fn normalize_item(
    position: usize,
    item: RemoteItem,
    lookup: &dyn TitleLookup,
    policy: UnplayablePolicy,
) -> Track {
    let url = item.url.trim().to_string();

    let title = match non_empty(item.title) {
        Some(title) => title,
        None => {
            let looked_up = match extract_video_id(&url) {
                Some(id) => lookup.lookup_title(&id).await,
                None => None,
            };
            looked_up.unwrap_or_else(|| format!("Track {}", position + 1))
        }
    };

    let mut track = Track::new(title, "", url.clone());
    if let Some(kind) = item.kind {
        track = track.with_kind(kind);
    }
    track.artist = non_empty(item.artist).unwrap_or_else(|| match track.kind {
        TrackKind::Video => "YouTube".to_string(),
        TrackKind::Audio => "Unknown artist".to_string(),
    });
    track.cover_url = non_empty(item.cover).unwrap_or_else(|| thumbnail_for(&url));
    track.duration_hint = Some(non_empty(item.duration).unwrap_or_else(|| UNKNOWN_DURATION.to_string()));
    track.fallback_audio_url = non_empty(item.audio_fallback);

    apply_policy(track, policy)
}

pub fn apply_policy(track: Track, policy: UnplayablePolicy) -> Track {
    match policy {
        UnplayablePolicy::AlwaysPlayable => Track {
            playable: true,
            warning: None,
            ..track
        },
        UnplayablePolicy::MarkUnplayable if track.kind == TrackKind::Video && !track.has_fallback() => {
            track.mark_unplayable("Needs an audio fallback")
        }
        UnplayablePolicy::MarkUnplayable => track,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Fixed list used when the remote playlist cannot be loaded
pub fn builtin_playlist() -> Vec<Track> {
    vec![
        Track::new("Beautiful Piano Music", "YouTube Artist", "https://www.youtube.com/watch?v=nZonjKs6cTs")
            .with_duration_hint("3:24")
            .with_fallback("https://www.learningcontainer.com/wp-content/uploads/2020/02/Kalimba.mp3"),
        Track::new("Lofi Hip Hop - Chill Beats", "YouTube Music", "https://www.youtube.com/watch?v=jfKfPfyJRdk")
            .with_duration_hint("LIVE"),
        Track::new("Kalimba", "Sample Music", "https://www.learningcontainer.com/wp-content/uploads/2020/02/Kalimba.mp3")
            .with_cover(PLACEHOLDER_COVER)
            .with_duration_hint("0:30"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FixedTitles(HashMap<&'static str, &'static str>);

    #[async_trait]
    impl TitleLookup for FixedTitles {
        async fn lookup_title(&self, video_id: &str) -> Option<String> {
            self.0.get(video_id).map(|t| t.to_string())
        }
    }

    fn lookup() -> FixedTitles {
        FixedTitles(HashMap::from([("known", "Looked Up Title")]))
    }

    #[test]
    fn parses_remote_json() {
        let json = r#"[
            {"title": "A", "url": "https://example.com/a.mp3", "duration": "1:00"},
            {"url": "https://youtu.be/known", "type": "youtube", "audioFallback": "https://example.com/f.mp3"}
        ]"#;
        let items: Vec<RemoteItem> = serde_json::from_str(json).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].kind, Some(TrackKind::Video));
        assert_eq!(items[1].audio_fallback.as_deref(), Some("https://example.com/f.mp3"));
    }

    #[tokio::test]
    async fn normalizes_missing_fields() {
        let items = vec![
            RemoteItem {
                url: "https://youtu.be/known".into(),
                ..Default::default()
            },
            RemoteItem {
                url: "https://youtu.be/unknown".into(),
                ..Default::default()
            },
            RemoteItem {
                url: "  ".into(),
                ..Default::default()
            },
            RemoteItem {
                title: Some("Song".into()),
                artist: Some("Band".into()),
                url: "https://example.com/song.mp3".into(),
                kind: Some(TrackKind::Video),
                ..Default::default()
            },
        ];

        let tracks = normalize_remote(items, &lookup(), UnplayablePolicy::AlwaysPlayable).await;
        assert_eq!(tracks.len(), 3);

        assert_eq!(tracks[0].title, "Looked Up Title");
        assert_eq!(tracks[0].artist, "YouTube");
        assert_eq!(tracks[0].kind, TrackKind::Video);
        assert_eq!(tracks[0].cover_url, "https://img.youtube.com/vi/known/mqdefault.jpg");
        assert_eq!(tracks[0].duration_hint.as_deref(), Some(UNKNOWN_DURATION));

        // Positional placeholder uses the original position
        assert_eq!(tracks[1].title, "Track 2");

        assert_eq!(tracks[2].title, "Song");
        assert_eq!(tracks[2].artist, "Band");
        assert_eq!(tracks[2].kind, TrackKind::Video);
        assert_eq!(tracks[2].cover_url, PLACEHOLDER_COVER);
    }

    #[tokio::test]
    async fn mark_unplayable_policy_flags_video_without_fallback() {
        let items = vec![
            RemoteItem {
                url: "https://youtu.be/a".into(),
                ..Default::default()
            },
            RemoteItem {
                url: "https://youtu.be/b".into(),
                audio_fallback: Some("https://example.com/b.mp3".into()),
                ..Default::default()
            },
            RemoteItem {
                url: "https://example.com/c.mp3".into(),
                ..Default::default()
            },
        ];
        let tracks = normalize_remote(items, &lookup(), UnplayablePolicy::MarkUnplayable).await;
        assert!(!tracks[0].playable);
        assert!(tracks[0].warning.is_some());
        assert!(tracks[1].playable);
        assert!(tracks[2].playable);
    }

    #[test]
    fn builtin_playlist_mixes_kinds() {
        let tracks = builtin_playlist();
        assert_eq!(tracks.len(), 3);
        assert_eq!(tracks[0].kind, TrackKind::Video);
        assert!(tracks[0].has_fallback());
        assert_eq!(tracks[1].kind, TrackKind::Video);
        assert!(!tracks[1].has_fallback());
        assert_eq!(tracks[2].kind, TrackKind::Audio);
        assert!(tracks.iter().all(|t| t.playable));
    }
}
