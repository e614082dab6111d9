mod filetype;
mod playlist;
mod track;

pub use filetype::FileType;
pub use playlist::{AddOutcome, Playlist};
pub use track::{FormatInfo, Track, TrackId, WaveformState};

#[cfg(test)]
mod tests;

pub(crate) static LEGAL_EXTENSION: std::sync::LazyLock<std::collections::HashSet<&'static str>> =
    std::sync::LazyLock::new(|| {
        std::collections::HashSet::from(["mp3", "m4a", "flac", "ogg", "wav"])
    });
