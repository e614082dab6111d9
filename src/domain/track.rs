use super::FileType;
use crate::{DurationStyle, get_readable_duration, metadata::TrackMeta};
use std::{
    fmt::Display,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

/// Stable identity of a playlist entry.
///
/// Assigned once when the track is added (from the file's signature at that
/// moment) and never recomputed for the track's lifetime, so it survives
/// reorders and stays valid as a key for background results. Doubles as the
/// waveform cache fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub(crate) u64);

impl TrackId {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[derive(Debug, Default, Clone)]
pub enum WaveformState {
    #[default]
    NotStarted,
    Generating,
    Ready(Arc<Vec<f32>>),
}

impl WaveformState {
    /// In-flight or finished; either way a new request would be wasted.
    pub fn is_settled_or_pending(&self) -> bool {
        !matches!(self, WaveformState::NotStarted)
    }
}

/// Technical attributes pulled lazily from the file by the metadata worker.
#[derive(Debug, Default, Clone)]
pub struct FormatInfo {
    pub filetype: FileType,
    pub codec: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_depth: Option<u32>,
    /// Bits per second, estimated from file size over duration.
    pub bit_rate: Option<u32>,
}

pub struct Track {
    pub(crate) id: TrackId,
    pub(crate) path: PathBuf,
    pub(crate) title: String,
    pub(crate) duration: Duration,
    pub(crate) format: Option<FormatInfo>,
    pub(crate) waveform: WaveformState,
    pub(crate) cover: Option<Arc<Vec<u8>>>,
    pub(crate) unplayable: bool,
}

impl Track {
    pub(crate) fn new(id: TrackId, path: PathBuf) -> Self {
        let title = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        Track {
            id,
            path,
            title,
            duration: Duration::ZERO,
            format: None,
            waveform: WaveformState::default(),
            cover: None,
            unplayable: false,
        }
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn duration_str(&self) -> String {
        get_readable_duration(self.duration, DurationStyle::Compact)
    }

    pub fn format(&self) -> Option<&FormatInfo> {
        self.format.as_ref()
    }

    pub fn waveform(&self) -> &WaveformState {
        &self.waveform
    }

    pub fn cover(&self) -> Option<&Arc<Vec<u8>>> {
        self.cover.as_ref()
    }

    pub fn is_unplayable(&self) -> bool {
        self.unplayable
    }

    pub(crate) fn set_waveform_state(&mut self, state: WaveformState) {
        self.waveform = state;
    }

    pub(crate) fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }

    pub(crate) fn mark_unplayable(&mut self) {
        self.unplayable = true;
    }

    pub(crate) fn clear_unplayable(&mut self) {
        self.unplayable = false;
    }

    /// Fold extractor output into the track. Missing fields leave the
    /// current values alone.
    pub(crate) fn apply_meta(&mut self, meta: TrackMeta) {
        if let Some(title) = meta.title {
            if !title.is_empty() {
                self.title = title;
            }
        }

        if let Some(duration) = meta.duration {
            if self.duration.is_zero() {
                self.duration = duration;
            }
        }

        if let Some(cover) = meta.cover {
            self.cover = Some(Arc::new(cover));
        }

        self.format = Some(meta.format);
    }
}
