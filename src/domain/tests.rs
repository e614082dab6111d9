use super::*;
use std::collections::HashSet;
use std::path::PathBuf;
use tempfile::TempDir;

fn scratch_tracks(names: &[&str]) -> (TempDir, Vec<PathBuf>) {
    let dir = tempfile::tempdir().unwrap();
    let paths = names
        .iter()
        .map(|name| {
            let path = dir.path().join(name);
            std::fs::write(&path, name.as_bytes()).unwrap();
            path
        })
        .collect();
    (dir, paths)
}

#[test]
fn add_assigns_stable_ids_in_order() {
    let (_dir, paths) = scratch_tracks(&["a.mp3", "b.mp3", "c.mp3"]);
    let mut playlist = Playlist::default();

    let outcome = playlist.add(&paths);

    assert_eq!(outcome.added.len(), 3);
    assert!(outcome.skipped.is_empty());
    assert_eq!(playlist.len(), 3);

    for (pos, id) in outcome.added.iter().enumerate() {
        assert_eq!(playlist.position_of(*id), Some(pos));
        assert_eq!(playlist.id_at(pos), Some(*id));
    }
}

#[test]
fn add_skips_duplicates_per_path() {
    let (_dir, paths) = scratch_tracks(&["a.mp3"]);
    let mut playlist = Playlist::default();

    let first = playlist.add(&paths);
    assert_eq!(first.added.len(), 1);

    let second = playlist.add(&paths);
    assert!(second.added.is_empty());
    assert_eq!(second.skipped, paths);
    assert_eq!(playlist.len(), 1);
}

#[test]
fn add_skips_unsupported_and_missing_paths() {
    let (dir, mut paths) = scratch_tracks(&["a.mp3", "notes.txt"]);
    paths.push(dir.path().join("gone.mp3"));

    let mut playlist = Playlist::default();
    let outcome = playlist.add(&paths);

    assert_eq!(outcome.added.len(), 1);
    assert_eq!(outcome.skipped.len(), 2);
}

#[test]
fn add_expands_directories_recursively() {
    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().join("album");
    std::fs::create_dir(&sub).unwrap();
    std::fs::write(dir.path().join("a.mp3"), b"a").unwrap();
    std::fs::write(sub.join("b.flac"), b"b").unwrap();
    std::fs::write(sub.join("cover.jpg"), b"jpg").unwrap();

    let mut playlist = Playlist::default();
    let outcome = playlist.add(&[dir.path().to_path_buf()]);

    assert_eq!(outcome.added.len(), 2);
    assert_eq!(playlist.len(), 2);
}

#[test]
fn add_honors_nomedia_markers() {
    let dir = tempfile::tempdir().unwrap();
    let hidden = dir.path().join("ignored");
    std::fs::create_dir(&hidden).unwrap();
    std::fs::write(hidden.join(".nomedia"), b"").unwrap();
    std::fs::write(hidden.join("secret.mp3"), b"s").unwrap();
    std::fs::write(dir.path().join("a.mp3"), b"a").unwrap();

    let mut playlist = Playlist::default();
    let outcome = playlist.add(&[dir.path().to_path_buf()]);

    assert_eq!(outcome.added.len(), 1);
}

#[test]
fn remove_preserves_order_of_the_rest() {
    let (_dir, paths) = scratch_tracks(&["a.mp3", "b.mp3", "c.mp3"]);
    let mut playlist = Playlist::default();
    let ids = playlist.add(&paths).added;

    let removed = playlist.remove(&HashSet::from([ids[1]]));

    assert_eq!(removed, 1);
    assert_eq!(playlist.len(), 2);
    assert!(playlist.get(ids[1]).is_none());
    assert_eq!(playlist.id_at(0), Some(ids[0]));
    assert_eq!(playlist.id_at(1), Some(ids[2]));
}

#[test]
fn removed_path_can_be_added_again() {
    let (_dir, paths) = scratch_tracks(&["a.mp3"]);
    let mut playlist = Playlist::default();
    let ids = playlist.add(&paths).added;

    playlist.remove(&HashSet::from([ids[0]]));
    let outcome = playlist.add(&paths);

    assert_eq!(outcome.added.len(), 1);
}

#[test]
fn move_track_reorders_without_touching_identity() {
    let (_dir, paths) = scratch_tracks(&["a.mp3", "b.mp3", "c.mp3"]);
    let mut playlist = Playlist::default();
    let ids = playlist.add(&paths).added;

    assert!(playlist.move_track(ids[2], 0));

    assert_eq!(playlist.id_at(0), Some(ids[2]));
    assert_eq!(playlist.id_at(1), Some(ids[0]));
    assert_eq!(playlist.id_at(2), Some(ids[1]));
    assert_eq!(playlist.get(ids[2]).unwrap().id(), ids[2]);
}

#[test]
fn move_track_clamps_position_and_rejects_unknown_ids() {
    let (_dir, paths) = scratch_tracks(&["a.mp3", "b.mp3"]);
    let mut playlist = Playlist::default();
    let ids = playlist.add(&paths).added;

    assert!(playlist.move_track(ids[0], 99));
    assert_eq!(playlist.id_at(1), Some(ids[0]));

    assert!(!playlist.move_track(TrackId(0xDEAD), 0));
}

#[test]
fn clear_forgets_paths_too() {
    let (_dir, paths) = scratch_tracks(&["a.mp3"]);
    let mut playlist = Playlist::default();
    playlist.add(&paths);

    playlist.clear();

    assert!(playlist.is_empty());
    assert_eq!(playlist.add(&paths).added.len(), 1);
}

#[test]
fn track_title_falls_back_to_file_stem() {
    let (_dir, paths) = scratch_tracks(&["Morning Dew.mp3"]);
    let mut playlist = Playlist::default();
    let ids = playlist.add(&paths).added;

    assert_eq!(playlist.get(ids[0]).unwrap().title(), "Morning Dew");
}

#[test]
fn signature_changes_when_the_file_changes() {
    let (dir, paths) = scratch_tracks(&["a.mp3"]);
    let first = crate::calculate_signature(&paths[0]).unwrap();
    let again = crate::calculate_signature(&paths[0]).unwrap();
    assert_eq!(first, again);

    std::fs::write(dir.path().join("a.mp3"), b"different length").unwrap();
    let changed = crate::calculate_signature(&paths[0]).unwrap();
    assert_ne!(first, changed);
}
