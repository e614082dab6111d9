mod engine;
pub use engine::Cadenza;


use crate::{DurationStyle, domain::TrackId, get_readable_duration, player::PlaybackState};
use std::time::Duration;

/// What changed since the caller last drained the engine, in the order
/// it changed.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Playlist membership or order changed.
    PlaylistChanged,
    /// One track gained metadata or a finished waveform.
    TrackUpdated(TrackId),
    /// The transport moved to a new state.
    PlaybackChanged(PlaybackState),
    /// A track could not be opened for playback.
    TrackFailed { id: TrackId, reason: String },
    /// Progress snapshot for the selected track, at most one per elapsed
    /// second plus one after every seek or track start.
    NowPlaying(NowPlayingInfo),
}

/// Everything a now-playing widget needs in one message.
#[derive(Debug, Clone, PartialEq)]
pub struct NowPlayingInfo {
    pub id: TrackId,
    pub title: String,
    pub elapsed: Duration,
    pub duration: Duration,
    pub is_playing: bool,
}

impl NowPlayingInfo {
    pub fn elapsed_str(&self) -> String {
        get_readable_duration(self.elapsed, DurationStyle::Compact)
    }

    pub fn duration_str(&self) -> String {
        get_readable_duration(self.duration, DurationStyle::Compact)
    }
}
