//! tunebox - playlist player for audio files and embedded videos
//!
//! Per track, the controller picks a playback backend (native audio, embedded
//! video player or bare embed), falls back to a track's audio url when the
//! primary backend fails, and keeps one normalized progress signal flowing to
//! the UI whatever backend is active.

pub mod audio;
pub mod backend;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod model;
pub mod view;

pub use backend::{
    AudioElement, Backend, BackendEvent, BackendKind, EventSender, IframeHost, LoadSequence, Readiness,
    ReadinessGate, TaggedEvent, VideoApiHost, VideoEventSender,
};
pub use config::{PlayerConfig, UnplayablePolicy};
pub use controller::{PlaybackController, PlayerEventChannel, PlayerHosts};
pub use error::{MediaError, PlayerError, PlayerResult};
pub use model::{
    PlaybackSession, PlayerState, PlaylistState, Progress, SessionSnapshot, Track, TrackDraft, TrackKind,
    VolumeState,
};
pub use view::PlayerUi;
