//! Player configuration
//!
//! Values come from `tunebox.json` in the working directory when it exists,
//! otherwise from the defaults below. `TUNEBOX_PLAYLIST_URL` overrides the
//! remote playlist location; setting it to an empty string disables the fetch.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::DEFAULT_VOLUME;

pub const CONFIG_FILE: &str = "tunebox.json";
pub const PLAYLIST_URL_ENV: &str = "TUNEBOX_PLAYLIST_URL";

const DEFAULT_PLAYLIST_URL: &str =
    "https://raw.githubusercontent.com/phamcongtruong/music-extension/refs/heads/main/music-list.json";

/// What to do with video tracks that have no audio fallback
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnplayablePolicy {
    /// Every track stays selectable; failures are handled by fallback-then-skip
    #[default]
    AlwaysPlayable,
    /// Video tracks without a fallback are flagged with a warning up front
    MarkUnplayable,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub remote_playlist_url: Option<String>,
    pub readiness_timeout_ms: u64,
    pub skip_delay_ms: u64,
    pub poll_interval_ms: u64,
    pub default_volume: f64,
    pub volume_step: f64,
    pub unplayable_policy: UnplayablePolicy,
    pub data_dir: PathBuf,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            remote_playlist_url: Some(DEFAULT_PLAYLIST_URL.to_string()),
            readiness_timeout_ms: 10_000,
            skip_delay_ms: 2_000,
            poll_interval_ms: 1_000,
            default_volume: DEFAULT_VOLUME,
            volume_step: 0.1,
            unplayable_policy: UnplayablePolicy::default(),
            data_dir: PathBuf::from(".data"),
        }
    }
}

impl PlayerConfig {
    pub fn load() -> Result<Self> {
        let mut config = Self::from_file(Path::new(CONFIG_FILE))?;
        if let Ok(url) = std::env::var(PLAYLIST_URL_ENV) {
            config.remote_playlist_url = Some(url);
        }
        config.normalize();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content).with_context(|| format!("invalid config in {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(content)?;
        config.normalize();
        Ok(config)
    }

    fn normalize(&mut self) {
        self.remote_playlist_url = self
            .remote_playlist_url
            .take()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        self.default_volume = self.default_volume.clamp(0.0, 1.0);
        self.volume_step = self.volume_step.clamp(0.0, 1.0);
        self.poll_interval_ms = self.poll_interval_ms.max(50);
    }

    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_millis(self.readiness_timeout_ms)
    }

    pub fn skip_delay(&self) -> Duration {
        Duration::from_millis(self.skip_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_player_timings() {
        let config = PlayerConfig::default();
        assert_eq!(config.readiness_timeout(), Duration::from_secs(10));
        assert_eq!(config.skip_delay(), Duration::from_secs(2));
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.unplayable_policy, UnplayablePolicy::AlwaysPlayable);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = PlayerConfig::from_json(
            r#"{"skip_delay_ms": 500, "unplayable_policy": "mark_unplayable", "default_volume": 3.0}"#,
        )
        .unwrap();
        assert_eq!(config.skip_delay(), Duration::from_millis(500));
        assert_eq!(config.unplayable_policy, UnplayablePolicy::MarkUnplayable);
        assert_eq!(config.default_volume, 1.0);
        assert_eq!(config.poll_interval_ms, 1_000);
    }

    #[test]
    fn empty_remote_url_disables_fetch() {
        let config = PlayerConfig::from_json(r#"{"remote_playlist_url": "  "}"#).unwrap();
        assert_eq!(config.remote_playlist_url, None);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let config = PlayerConfig::from_file(Path::new("/nonexistent/tunebox.json")).unwrap();
        assert_eq!(config, PlayerConfig::default());
    }
}
