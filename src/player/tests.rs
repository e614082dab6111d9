use super::*;
use crate::domain::{Track, TrackId};
use anyhow::Result;
use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

#[derive(Default)]
struct FakeState {
    playing: Option<PathBuf>,
    paused: bool,
    ended: bool,
    fail_next: bool,
    seeks: Vec<Duration>,
}

/// Scripted backend; the test pokes the shared state to simulate the
/// audio device.
#[derive(Clone, Default)]
struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

impl CadenzaBackend for FakeBackend {
    fn play(&mut self, path: &Path) -> Result<Option<Duration>> {
        let mut state = self.state.lock().unwrap();
        if state.fail_next {
            anyhow::bail!("fake decoder rejected the file");
        }
        state.playing = Some(path.to_path_buf());
        state.paused = false;
        state.ended = false;
        Ok(Some(Duration::from_secs(3)))
    }

    fn pause(&mut self) {
        self.state.lock().unwrap().paused = true;
    }

    fn resume(&mut self) {
        self.state.lock().unwrap().paused = false;
    }

    fn stop(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.playing = None;
        state.ended = true;
    }

    fn seek_to(&mut self, pos: Duration) -> Result<()> {
        self.state.lock().unwrap().seeks.push(pos);
        Ok(())
    }

    fn position(&self) -> Duration {
        Duration::from_millis(500)
    }

    fn track_ended(&self) -> bool {
        self.state.lock().unwrap().ended
    }
}

fn spawn_fake() -> (PlayerHandle, FakeBackend) {
    let fake = FakeBackend::default();
    let for_thread = fake.clone();
    let handle = PlayerHandle::spawn_with(move || -> Result<Box<dyn CadenzaBackend>> {
        Ok(Box::new(for_thread))
    })
    .unwrap();
    (handle, fake)
}

fn test_track(id: u64) -> CadenzaTrack {
    let track = Track::new(TrackId(id), PathBuf::from(format!("/music/{id}.flac")));
    CadenzaTrack::from(&track)
}

fn wait_until(timeout: Duration, mut probe: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if probe() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    false
}

#[test]
fn playback_state_round_trips_through_u8() {
    for state in [
        PlaybackState::Idle,
        PlaybackState::Loading,
        PlaybackState::Playing,
        PlaybackState::Paused,
        PlaybackState::Stopped,
        PlaybackState::Failed,
    ] {
        let raw: u8 = state.into();
        assert_eq!(PlaybackState::try_from(raw), Ok(state));
    }

    assert!(PlaybackState::try_from(9).is_err());
}

#[test]
fn repeat_mode_cycles_through_all_three() {
    let mode = RepeatMode::default();
    assert_eq!(mode, RepeatMode::RepeatNone);
    assert_eq!(mode.next(), RepeatMode::RepeatSingle);
    assert_eq!(mode.next().next(), RepeatMode::RepeatPlaylist);
    assert_eq!(mode.next().next().next(), RepeatMode::RepeatNone);
}

#[test]
fn tracks_compare_by_identity_not_path() {
    let a = Track::new(TrackId(1), PathBuf::from("/music/a.flac"));
    let b = Track::new(TrackId(1), PathBuf::from("/music/b.flac"));
    let c = Track::new(TrackId(2), PathBuf::from("/music/a.flac"));

    assert_eq!(CadenzaTrack::from(&a), CadenzaTrack::from(&b));
    assert_ne!(CadenzaTrack::from(&a), CadenzaTrack::from(&c));
}

#[test]
fn play_reports_started_then_finished() {
    let (handle, fake) = spawn_fake();
    let track = test_track(7);

    handle.play(track.clone(), true).unwrap();

    match handle.events().recv_timeout(Duration::from_secs(2)) {
        Ok(PlayerEvent::TrackStarted {
            track: started,
            autoplay,
            duration,
        }) => {
            assert_eq!(started, track);
            assert!(autoplay);
            assert_eq!(duration, Some(Duration::from_secs(3)));
        }
        other => panic!("expected TrackStarted, got {other:?}"),
    }
    assert!(wait_until(Duration::from_secs(2), || {
        handle.get_playback_state() == PlaybackState::Playing
    }));

    // Simulate the device running out of audio
    fake.state.lock().unwrap().ended = true;

    match handle.events().recv_timeout(Duration::from_secs(2)) {
        Ok(PlayerEvent::TrackFinished(id)) => assert_eq!(id, TrackId(7)),
        other => panic!("expected TrackFinished, got {other:?}"),
    }
    assert!(wait_until(Duration::from_secs(2), || {
        handle.get_playback_state() == PlaybackState::Stopped
    }));
}

#[test]
fn starting_paused_keeps_the_device_paused() {
    let (handle, fake) = spawn_fake();

    handle.play(test_track(3), false).unwrap();

    match handle.events().recv_timeout(Duration::from_secs(2)) {
        Ok(PlayerEvent::TrackStarted { autoplay, .. }) => assert!(!autoplay),
        other => panic!("expected TrackStarted, got {other:?}"),
    }
    assert!(fake.state.lock().unwrap().paused);
    assert_eq!(handle.get_playback_state(), PlaybackState::Paused);
}

#[test]
fn failed_play_reports_the_reason() {
    let (handle, fake) = spawn_fake();
    fake.state.lock().unwrap().fail_next = true;

    handle.play(test_track(9), true).unwrap();

    match handle.events().recv_timeout(Duration::from_secs(2)) {
        Ok(PlayerEvent::TrackFailed { id, reason }) => {
            assert_eq!(id, TrackId(9));
            assert!(reason.contains("rejected"));
        }
        other => panic!("expected TrackFailed, got {other:?}"),
    }
    assert_eq!(handle.get_playback_state(), PlaybackState::Failed);
}

#[test]
fn pause_and_resume_flip_state() {
    let (handle, fake) = spawn_fake();
    handle.play(test_track(1), true).unwrap();
    handle
        .events()
        .recv_timeout(Duration::from_secs(2))
        .expect("track started");

    handle.pause().unwrap();
    assert!(wait_until(Duration::from_secs(2), || {
        handle.get_playback_state() == PlaybackState::Paused
    }));
    assert!(fake.state.lock().unwrap().paused);

    handle.resume().unwrap();
    assert!(wait_until(Duration::from_secs(2), || {
        handle.get_playback_state() == PlaybackState::Playing
    }));
    assert!(!fake.state.lock().unwrap().paused);
}

#[test]
fn seek_commands_reach_the_backend() {
    let (handle, fake) = spawn_fake();
    handle.play(test_track(1), true).unwrap();
    handle
        .events()
        .recv_timeout(Duration::from_secs(2))
        .expect("track started");

    handle.seek_to(Duration::from_secs(42)).unwrap();

    assert!(wait_until(Duration::from_secs(2), || {
        fake.state.lock().unwrap().seeks.contains(&Duration::from_secs(42))
    }));
}

#[test]
fn backend_init_failure_surfaces_at_spawn() {
    let result = PlayerHandle::spawn_with(|| anyhow::bail!("no output device"));
    assert!(result.is_err());
}
