//! Model module - Player state and data types
//!
//! Plain data and the rules that only touch data. Nothing here talks to a
//! backend or to the UI.
//!
//! - `track`: track descriptor, url classification, video id extraction
//! - `playlist`: ordered tracks, cursor, shuffle/repeat sequencing
//! - `playback`: playback session, player state, normalized progress
//! - `volume`: volume and mute state
//! - `remote`: remote playlist descriptors, title lookup, built-in playlist
//! - `store`: persistence of the playlist and session snapshot

mod playback;
mod playlist;
mod remote;
mod store;
mod track;
mod volume;

pub use track::{
    classify_url, embed_url, extract_video_id, format_time, is_video_url, parse_duration_hint,
    thumbnail_for, Track, TrackDraft, TrackKind, PLACEHOLDER_COVER, UNKNOWN_DURATION,
};

pub use playlist::PlaylistState;

pub use playback::{PlaybackSession, PlayerState, Progress, SessionSnapshot};

pub use volume::{VolumeState, DEFAULT_VOLUME};

pub use remote::{
    apply_policy, builtin_playlist, normalize_remote, HttpPlaylistSource, OEmbedTitleLookup,
    PlaylistSource, RemoteItem, TitleLookup,
};

pub use store::{JsonFileStore, PlaylistStore};
