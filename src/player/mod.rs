mod backend_rodio;
mod core;
mod handle;
mod metrics;
mod track;

pub use backend_rodio::RodioBackend;
pub use handle::PlayerHandle;
pub use metrics::PlaybackMetrics;
pub use track::CadenzaTrack;

use crate::domain::TrackId;
use anyhow::Result;
use std::{path::Path, time::Duration};

#[cfg(test)]
mod tests;

/// Audio output seam for the playback thread.
///
/// Implementations are created on the playback thread itself (output
/// streams cannot move between threads) and are only ever driven from
/// there, one command at a time.
pub trait CadenzaBackend {
    /// Replace whatever is queued with `path` and start decoding it from
    /// the beginning. Returns the source's reported duration when the
    /// container knows it.
    fn play(&mut self, path: &Path) -> Result<Option<Duration>>;
    fn pause(&mut self);
    fn resume(&mut self);
    fn stop(&mut self);
    fn seek_to(&mut self, pos: Duration) -> Result<()>;
    fn position(&self) -> Duration;
    fn track_ended(&self) -> bool;
}

#[derive(Debug)]
pub enum PlayerEvent {
    TrackStarted {
        track: CadenzaTrack,
        autoplay: bool,
        duration: Option<Duration>,
    },
    TrackFinished(TrackId),
    TrackFailed {
        id: TrackId,
        reason: String,
    },
}

pub enum PlayerCommand {
    Play { track: CadenzaTrack, autoplay: bool },
    Pause,
    Resume,
    SeekTo(Duration),
    Stop,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PlaybackState {
    /// Nothing selected yet, or the selection was removed.
    #[default]
    Idle = 0,
    /// A selection was handed to the playback thread and has not started.
    Loading = 1,
    Playing = 2,
    Paused = 3,
    /// A track ran to completion (or was stopped) and nothing followed it.
    Stopped = 4,
    /// The selected track could not be opened. Cleared by the next load.
    Failed = 5,
}

impl From<PlaybackState> for u8 {
    fn from(state: PlaybackState) -> u8 {
        state as u8
    }
}

impl TryFrom<u8> for PlaybackState {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PlaybackState::Idle),
            1 => Ok(PlaybackState::Loading),
            2 => Ok(PlaybackState::Playing),
            3 => Ok(PlaybackState::Paused),
            4 => Ok(PlaybackState::Stopped),
            5 => Ok(PlaybackState::Failed),
            _ => Err(()),
        }
    }
}

impl PlaybackState {
    /// States in which a position inside the track is meaningful.
    pub fn has_position(&self) -> bool {
        matches!(self, PlaybackState::Playing | PlaybackState::Paused)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RepeatMode {
    /// Stop at the end of the playlist.
    #[default]
    RepeatNone,
    /// Replay the finished track forever.
    RepeatSingle,
    /// Wrap from the last track back to the first.
    RepeatPlaylist,
}

impl RepeatMode {
    pub fn next(self) -> Self {
        match self {
            RepeatMode::RepeatNone => RepeatMode::RepeatSingle,
            RepeatMode::RepeatSingle => RepeatMode::RepeatPlaylist,
            RepeatMode::RepeatPlaylist => RepeatMode::RepeatNone,
        }
    }
}
