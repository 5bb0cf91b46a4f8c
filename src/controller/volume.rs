//! Volume control methods

use crate::model::VolumeState;

use super::playback::apply_backend_volume;
use super::{ControllerState, PlaybackController};

impl PlaybackController {
    pub async fn set_volume(&self, level: f64) -> VolumeState {
        let mut state = self.state.lock().await;
        state.volume.set(level);
        self.apply_volume(&mut state)
    }

    pub async fn toggle_mute(&self) -> VolumeState {
        let mut state = self.state.lock().await;
        state.volume.toggle_mute();
        self.apply_volume(&mut state)
    }

    pub async fn adjust_volume(&self, delta: f64) -> VolumeState {
        let mut state = self.state.lock().await;
        state.volume.adjust_by(delta);
        self.apply_volume(&mut state)
    }

    pub async fn volume_up(&self) -> VolumeState {
        self.adjust_volume(self.config.volume_step).await
    }

    pub async fn volume_down(&self) -> VolumeState {
        self.adjust_volume(-self.config.volume_step).await
    }

    // Only the active backend hears about it; the next one gets it on activation.
    fn apply_volume(&self, state: &mut ControllerState) -> VolumeState {
        let volume = state.volume;
        if let Some(backend) = state.active.as_mut() {
            apply_backend_volume(backend, volume.effective());
        }
        tracing::debug!(level = volume.level(), muted = volume.is_muted(), "Volume changed");
        self.ui.update_volume(volume);
        volume
    }
}
