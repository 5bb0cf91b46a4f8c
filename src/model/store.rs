//! Persistence of the playlist and of the last session snapshot

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use super::playback::SessionSnapshot;
use super::track::Track;

const PLAYLIST_FILE: &str = "playlist.json";
const SESSION_FILE: &str = "session.json";

/// Key-value persistence used by the controller. Missing entries read as `None`.
pub trait PlaylistStore: Send + Sync {
    fn load_playlist(&self) -> Result<Option<Vec<Track>>>;
    fn save_playlist(&self, tracks: &[Track]) -> Result<()>;
    fn load_session(&self) -> Result<Option<SessionSnapshot>>;
    fn save_session(&self, snapshot: &SessionSnapshot) -> Result<()>;
}

/// Stores each entry as a JSON file under a data directory
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.dir.join(name);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        let value = serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(value))
    }

    fn write<T: serde::Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        let content = serde_json::to_string_pretty(value)?;
        fs::write(self.dir.join(name), content)?;
        Ok(())
    }
}

impl PlaylistStore for JsonFileStore {
    fn load_playlist(&self) -> Result<Option<Vec<Track>>> {
        self.read(PLAYLIST_FILE)
    }

    fn save_playlist(&self, tracks: &[Track]) -> Result<()> {
        self.write(PLAYLIST_FILE, tracks)
    }

    fn load_session(&self) -> Result<Option<SessionSnapshot>> {
        self.read(SESSION_FILE)
    }

    fn save_session(&self, snapshot: &SessionSnapshot) -> Result<()> {
        self.write(SESSION_FILE, snapshot)
    }
}
