//! Error types for playback, playlist loading and persistence

use thiserror::Error;

use crate::backend::BackendKind;

/// Failure reported by a native audio element while loading or starting a source
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("network error while fetching audio")]
    Network,

    #[error("audio could not be decoded")]
    Decode,

    #[error("audio format or source not supported")]
    SourceNotSupported,

    #[error("loading was aborted")]
    Aborted,

    #[error("{0}")]
    Other(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayerError {
    #[error("invalid url: {0:?}")]
    InvalidUrl(String),

    #[error("track {title:?} cannot be played and has no audio fallback")]
    UnplayableNoFallback { title: String },

    #[error("backend failed to load: {0}")]
    BackendLoadFailure(#[from] MediaError),

    #[error("video player api is unavailable")]
    BackendApiUnavailable,

    #[error("video owner restricts embedded playback")]
    VideoRestricted,

    #[error("video was removed or does not exist")]
    VideoRemoved,

    #[error("invalid video id")]
    VideoInvalidId,

    #[error("video cannot be played by the html5 player")]
    NotHtml5Playable,

    #[error("cannot extract a video id from {0:?}")]
    VideoIdUnavailable(String),

    #[error("remote playlist fetch failed: {0}")]
    RemoteFetchFailure(String),

    #[error("{backend:?} backend does not support {operation}")]
    UnsupportedOperation {
        backend: BackendKind,
        operation: &'static str,
    },

    #[error("track index {index} out of range (playlist has {len} tracks)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("store error: {0}")]
    Store(String),
}

impl PlayerError {
    /// Whether this failure should trigger the audio fallback of a track
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            PlayerError::BackendLoadFailure(_)
                | PlayerError::BackendApiUnavailable
                | PlayerError::VideoRestricted
                | PlayerError::VideoRemoved
                | PlayerError::VideoInvalidId
                | PlayerError::NotHtml5Playable
                | PlayerError::VideoIdUnavailable(_)
        )
    }
}

pub type PlayerResult<T> = Result<T, PlayerError>;
