//! Degraded iframe adapter

use std::sync::Arc;

use crate::error::{MediaError, PlayerResult};
use crate::model::embed_url;

/// A surface that can show a bare autoplay embed. Nothing can be read back from it.
pub trait IframeHost: Send + Sync {
    fn mount(&self, embed_url: &str) -> Result<(), MediaError>;
    fn clear(&self);
}

pub struct VideoIframeAdapter {
    host: Arc<dyn IframeHost>,
    video_id: String,
    mounted: bool,
}

impl VideoIframeAdapter {
    pub fn new(host: Arc<dyn IframeHost>, video_id: impl Into<String>) -> Self {
        Self {
            host,
            video_id: video_id.into(),
            mounted: false,
        }
    }

    pub(super) fn load(&mut self) -> PlayerResult<()> {
        let url = embed_url(&self.video_id);
        tracing::debug!(%url, "Mounting embed");
        self.host.mount(&url)?;
        self.mounted = true;
        Ok(())
    }

    // The embed autoplays; there is nothing further to start.
    pub(super) fn play(&mut self) -> PlayerResult<()> {
        if self.mounted {
            Ok(())
        } else {
            self.load()
        }
    }

    pub(super) fn stop(&mut self) {
        if self.mounted {
            self.host.clear();
            self.mounted = false;
        }
    }
}
