use super::{LEGAL_EXTENSION, Track, TrackId};
use crate::calculate_signature;
use indexmap::IndexMap;
use rayon::prelude::*;
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Ordered set of tracks, keyed by identity, with at most one track per
/// source path. All mutation happens on the owner's thread; background
/// workers only ever see (id, path) copies.
#[derive(Default)]
pub struct Playlist {
    tracks: IndexMap<TrackId, Track>,
    paths: HashSet<PathBuf>,
}

/// What `add` did with each requested path.
#[derive(Debug, Default)]
pub struct AddOutcome {
    pub added: Vec<TrackId>,
    pub skipped: Vec<PathBuf>,
}

impl Playlist {
    /// Append tracks for the given paths. Directories are walked
    /// recursively and filtered down to supported audio extensions.
    ///
    /// A path is skipped when it is already present, has no supported
    /// extension, or its file metadata cannot be read (no identity can be
    /// assigned without it).
    pub fn add(&mut self, paths: &[PathBuf]) -> AddOutcome {
        let mut outcome = AddOutcome::default();

        for requested in paths {
            if requested.is_dir() {
                for file in collect_valid_files(requested) {
                    self.add_file(file, &mut outcome);
                }
            } else {
                self.add_file(requested.clone(), &mut outcome);
            }
        }

        outcome
    }

    fn add_file(&mut self, path: PathBuf, outcome: &mut AddOutcome) {
        let legal = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| LEGAL_EXTENSION.contains(ext.to_lowercase().as_str()))
            .unwrap_or(false);

        if !legal {
            outcome.skipped.push(path);
            return;
        }

        let canon = match path.canonicalize() {
            Ok(canon) => canon,
            Err(_) => {
                outcome.skipped.push(path);
                return;
            }
        };

        if self.paths.contains(&canon) {
            outcome.skipped.push(path);
            return;
        }

        let id = match calculate_signature(&canon) {
            Ok(sig) => TrackId(sig),
            Err(_) => {
                outcome.skipped.push(path);
                return;
            }
        };

        if self.tracks.contains_key(&id) {
            outcome.skipped.push(path);
            return;
        }

        self.paths.insert(canon.clone());
        self.tracks.insert(id, Track::new(id, canon));
        outcome.added.push(id);
    }

    /// Remove every listed id, preserving the order of the rest.
    /// Unknown ids are ignored.
    pub fn remove(&mut self, ids: &HashSet<TrackId>) -> usize {
        let mut removed = 0;

        for id in ids {
            if let Some(track) = self.tracks.shift_remove(id) {
                self.paths.remove(track.path());
                removed += 1;
            }
        }

        removed
    }

    /// Move a track to `to_position` (clamped to the end), shifting the
    /// tracks in between. Returns false for an unknown id.
    pub fn move_track(&mut self, id: TrackId, to_position: usize) -> bool {
        let from = match self.tracks.get_index_of(&id) {
            Some(from) => from,
            None => return false,
        };

        let to = to_position.min(self.tracks.len().saturating_sub(1));
        if from != to {
            self.tracks.move_index(from, to);
        }

        true
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        self.paths.clear();
    }

    pub fn track_at(&self, position: usize) -> Option<&Track> {
        self.tracks.get_index(position).map(|(_, track)| track)
    }

    pub fn id_at(&self, position: usize) -> Option<TrackId> {
        self.tracks.get_index(position).map(|(id, _)| *id)
    }

    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TrackId) -> Option<&mut Track> {
        self.tracks.get_mut(&id)
    }

    pub fn position_of(&self, id: TrackId) -> Option<usize> {
        self.tracks.get_index_of(&id)
    }

    pub fn contains(&self, id: TrackId) -> bool {
        self.tracks.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = TrackId> + '_ {
        self.tracks.keys().copied()
    }
}

/// Collect playable files under a root directory.
///
/// Folders with a `.nomedia` file are ignored.
fn collect_valid_files(dir: impl AsRef<Path>) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !e.path().join(".nomedia").exists())
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .collect::<Vec<_>>()
        .into_par_iter()
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| LEGAL_EXTENSION.contains(ext.to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .map(|e| e.path().to_path_buf())
        .collect()
}
