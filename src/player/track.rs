use crate::domain::{Track, TrackId};
use std::path::{Path, PathBuf};

/// The slice of a track the playback thread needs: identity plus source
/// path. Snapshotted at send time so the thread never touches the
/// playlist.
#[derive(Debug, Clone)]
pub struct CadenzaTrack {
    id: TrackId,
    path: PathBuf,
}

impl PartialEq for CadenzaTrack {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl From<&Track> for CadenzaTrack {
    fn from(track: &Track) -> Self {
        CadenzaTrack {
            id: track.id(),
            path: track.path().to_path_buf(),
        }
    }
}

impl CadenzaTrack {
    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
