use super::{Notification, NowPlayingInfo};
use crate::{
    REFRESH_RATE,
    config::PlayerConfig,
    domain::{AddOutcome, Playlist, Track, TrackId, WaveformState},
    error::PlayerError,
    metadata::{MetadataResult, MetadataService},
    player::{CadenzaBackend, CadenzaTrack, PlaybackState, PlayerEvent, PlayerHandle, RepeatMode},
    waveform::{
        JobPriority, PreloadDue, PreloadScheduler, WaveformCache, WaveformJob, WaveformResult,
        WaveformService,
    },
};
use anyhow::Result;
use crossbeam_channel::{Receiver, select};
use std::{collections::HashSet, path::PathBuf, sync::Arc, thread, time::Duration};

/// The player core: playlist, selection and transport state, plus the
/// channels to the playback thread and the background workers.
///
/// All mutation funnels through this struct on the caller's thread.
/// Workers never touch the playlist; they post results keyed by track
/// identity and the engine decides whether those results still apply.
pub struct Cadenza {
    playlist: Playlist,
    cursor: Option<TrackId>,
    state: PlaybackState,
    repeat: RepeatMode,
    last_error: Option<PlayerError>,

    player: PlayerHandle,
    waveforms: WaveformService,
    metadata: MetadataService,
    scheduler: PreloadScheduler,
    preload_due: Receiver<PreloadDue>,
    /// Bumped on every selection change; orphans sleeping preload timers.
    generation: u64,

    config: PlayerConfig,
    pending: Vec<Notification>,
    last_published_secs: u64,
}

impl Cadenza {
    /// Bring the engine up against the default audio device.
    pub fn new(config: PlayerConfig) -> Result<Self> {
        let player = PlayerHandle::spawn()?;
        Self::assemble(config, player)
    }

    /// Bring the engine up with a caller-supplied playback backend. The
    /// factory runs on the playback thread.
    pub fn with_backend<F>(config: PlayerConfig, make_backend: F) -> Result<Self>
    where
        F: FnOnce() -> Result<Box<dyn CadenzaBackend>> + Send + 'static,
    {
        let player = PlayerHandle::spawn_with(make_backend)?;
        Self::assemble(config, player)
    }

    fn assemble(config: PlayerConfig, player: PlayerHandle) -> Result<Self> {
        let cache = WaveformCache::open(config.cache.resolve_dir()?)?;

        // Expired records are swept off the interactive path
        let sweeper = cache.clone();
        let retention = config.cache.retention();
        thread::spawn(move || {
            let removed = sweeper.sweep(retention);
            if removed > 0 {
                log::info!("swept {removed} expired waveform records");
            }
        });

        let waveforms = WaveformService::spawn(cache);
        let metadata = MetadataService::spawn();

        let (due_tx, due_rx) = PreloadScheduler::channel();
        let scheduler = PreloadScheduler::new(
            due_tx,
            Duration::from_millis(config.preload.next_delay_ms),
            Duration::from_millis(config.preload.later_delay_ms),
        );

        Ok(Cadenza {
            playlist: Playlist::default(),
            cursor: None,
            state: PlaybackState::Idle,
            repeat: RepeatMode::default(),
            last_error: None,
            player,
            waveforms,
            metadata,
            scheduler,
            preload_due: due_rx,
            generation: 0,
            config,
            pending: Vec::new(),
            last_published_secs: u64::MAX,
        })
    }
}

// ================
//    EVENT PUMP
// ================
impl Cadenza {
    /// Wait for the next background message (or one refresh tick), fold
    /// everything pending into the engine, and hand back what changed.
    ///
    /// Intended as the body of a frontend's event loop.
    pub fn pump(&mut self) -> Vec<Notification> {
        // Cloned so the arms below can borrow the engine mutably.
        let player_events = self.player.events().clone();
        let waveform_results = self.waveforms.results().clone();
        let metadata_results = self.metadata.results().clone();
        let preload_due = self.preload_due.clone();

        select! {
            recv(player_events) -> event => {
                if let Ok(event) = event {
                    self.handle_player_event(event);
                }
            }
            recv(waveform_results) -> result => {
                if let Ok(result) = result {
                    self.apply_waveform(result);
                }
            }
            recv(metadata_results) -> result => {
                if let Ok(result) = result {
                    self.apply_metadata(result);
                }
            }
            recv(preload_due) -> due => {
                if let Ok(due) = due {
                    self.handle_preload_due(due);
                }
            }
            default(REFRESH_RATE) => {}
        }

        self.poll()
    }

    /// Fold in whatever has already arrived, without blocking.
    pub fn poll(&mut self) -> Vec<Notification> {
        while let Ok(event) = self.player.events().try_recv() {
            self.handle_player_event(event);
        }
        while let Ok(result) = self.waveforms.results().try_recv() {
            self.apply_waveform(result);
        }
        while let Ok(result) = self.metadata.results().try_recv() {
            self.apply_metadata(result);
        }
        while let Ok(due) = self.preload_due.try_recv() {
            self.handle_preload_due(due);
        }

        self.publish_progress();
        std::mem::take(&mut self.pending)
    }

    pub(crate) fn handle_player_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::TrackStarted {
                track,
                autoplay,
                duration,
            } => {
                if self.state != PlaybackState::Loading || self.cursor != Some(track.id()) {
                    return; // answer to a selection that has since been replaced
                }

                let mut updated = false;
                if let Some(entry) = self.playlist.get_mut(track.id()) {
                    if entry.is_unplayable() {
                        entry.clear_unplayable();
                        updated = true;
                    }
                    if let Some(duration) = duration {
                        if entry.duration().is_zero() {
                            entry.set_duration(duration);
                            updated = true;
                        }
                    }
                }
                if updated {
                    self.notify(Notification::TrackUpdated(track.id()));
                }

                self.set_state(match autoplay {
                    true => PlaybackState::Playing,
                    false => PlaybackState::Paused,
                });
                self.force_progress();
            }
            PlayerEvent::TrackFinished(id) => {
                if self.cursor == Some(id) && self.state.has_position() {
                    self.handle_track_finished();
                }
            }
            PlayerEvent::TrackFailed { id, reason } => self.handle_track_failed(id, reason),
        }
    }

    fn handle_track_finished(&mut self) {
        let Some(pos) = self.cursor_position() else {
            self.set_state(PlaybackState::Stopped);
            return;
        };

        match self.repeat {
            RepeatMode::RepeatSingle => {
                if let Some(id) = self.cursor {
                    self.select_track(id, true);
                }
            }
            RepeatMode::RepeatPlaylist => {
                let next = (pos + 1) % self.playlist.len();
                if let Some(id) = self.playlist.id_at(next) {
                    self.select_track(id, true);
                }
            }
            RepeatMode::RepeatNone => match self.playlist.id_at(pos + 1) {
                Some(id) => self.select_track(id, true),
                None => self.set_state(PlaybackState::Stopped),
            },
        }
    }

    fn handle_track_failed(&mut self, id: TrackId, reason: String) {
        let Some(track) = self.playlist.get_mut(id) else {
            return; // the track was removed before the report arrived
        };
        track.mark_unplayable();
        let path = track.path().display().to_string();

        if self.cursor == Some(id) && self.state == PlaybackState::Loading {
            self.last_error = Some(PlayerError::DecodeOpen {
                path,
                reason: reason.clone(),
            });
            self.set_state(PlaybackState::Failed);
        }

        self.notify(Notification::TrackFailed { id, reason });
    }
}

// ================
//    TRANSPORT
// ================
impl Cadenza {
    /// Make `id` the selected track and hand it to the playback thread.
    /// Unknown ids are ignored.
    pub fn select_track(&mut self, id: TrackId, autoplay: bool) {
        let Some(track) = self.playlist.get(id) else {
            return;
        };
        let snapshot = CadenzaTrack::from(track);

        self.cursor = Some(id);
        self.generation += 1;
        self.last_error = None;
        self.set_state(PlaybackState::Loading);

        self.send_command(self.player.play(snapshot, autoplay));
        self.request_waveform(id, JobPriority::High);
        self.kick_preload();
    }

    pub fn select_position(&mut self, position: usize, autoplay: bool) {
        if let Some(id) = self.playlist.id_at(position) {
            self.select_track(id, autoplay);
        }
    }

    /// Resume when paused; otherwise start the selected track, or the
    /// first track when nothing is selected yet.
    pub fn play(&mut self) {
        match self.state {
            PlaybackState::Paused => {
                self.send_command(self.player.resume());
                self.set_state(PlaybackState::Playing);
            }
            PlaybackState::Idle | PlaybackState::Stopped | PlaybackState::Failed => {
                if let Some(id) = self.cursor.or_else(|| self.playlist.id_at(0)) {
                    self.select_track(id, true);
                }
            }
            PlaybackState::Loading | PlaybackState::Playing => {}
        }
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.send_command(self.player.pause());
            self.set_state(PlaybackState::Paused);
        }
    }

    pub fn play_pause(&mut self) {
        match self.state {
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused => self.play(),
            _ => {}
        }
    }

    /// Stop playback but keep the selection, so `play` starts it over.
    pub fn stop(&mut self) {
        if matches!(
            self.state,
            PlaybackState::Loading | PlaybackState::Playing | PlaybackState::Paused
        ) {
            self.send_command(self.player.stop());
            self.set_state(PlaybackState::Stopped);
        }
    }

    /// Select the track after the cursor. Wraps to the front only when
    /// the whole playlist repeats. A paused player stays paused.
    pub fn next(&mut self) {
        let Some(pos) = self.cursor_position() else {
            return;
        };

        let target = match self.playlist.id_at(pos + 1) {
            Some(id) => Some(id),
            None if self.repeat == RepeatMode::RepeatPlaylist => self.playlist.id_at(0),
            None => None,
        };

        if let Some(id) = target {
            let autoplay = self.state != PlaybackState::Paused;
            self.select_track(id, autoplay);
        }
    }

    /// Select the track before the cursor. Does not wrap.
    pub fn previous(&mut self) {
        let Some(pos) = self.cursor_position() else {
            return;
        };
        if pos == 0 {
            return;
        }

        if let Some(id) = self.playlist.id_at(pos - 1) {
            let autoplay = self.state != PlaybackState::Paused;
            self.select_track(id, autoplay);
        }
    }

    /// Jump to `position`, clamped to the track length when it is known.
    pub fn seek_to(&mut self, position: Duration) {
        if !self.state.has_position() {
            return;
        }
        let Some(track) = self.current_track() else {
            return;
        };

        let duration = track.duration();
        let target = match duration.is_zero() {
            true => position,
            false => position.min(duration),
        };

        self.send_command(self.player.seek_to(target));

        // Report the target right away rather than waiting for the
        // device position to catch up.
        self.last_published_secs = target.as_secs();
        self.push_now_playing(target);
    }

    pub fn seek_forward(&mut self, secs: u64) {
        self.seek_to(self.player.elapsed() + Duration::from_secs(secs));
    }

    pub fn seek_back(&mut self, secs: u64) {
        let target = self.player.elapsed().saturating_sub(Duration::from_secs(secs));
        self.seek_to(target);
    }
}

// ================
//    PLAYLIST
// ================
impl Cadenza {
    /// Append files or directory trees to the playlist and queue the new
    /// tracks for metadata extraction.
    pub fn add_paths(&mut self, paths: &[PathBuf]) -> AddOutcome {
        let outcome = self.playlist.add(paths);

        if !outcome.added.is_empty() {
            let batch = outcome
                .added
                .iter()
                .filter_map(|&id| {
                    self.playlist
                        .get(id)
                        .map(|track| (id, track.path().to_path_buf()))
                })
                .collect();
            self.metadata.request(batch);
            self.notify(Notification::PlaylistChanged);
        }

        outcome
    }

    /// Remove tracks by identity. Removing the selected track stops
    /// playback and returns the engine to `Idle` with nothing selected.
    pub fn remove_tracks(&mut self, ids: &HashSet<TrackId>) -> usize {
        let removing_selection = self.cursor.is_some_and(|id| ids.contains(&id));
        if removing_selection {
            self.send_command(self.player.stop());
            self.cursor = None;
            self.set_state(PlaybackState::Idle);
        }

        let removed = self.playlist.remove(ids);
        if removed > 0 {
            self.generation += 1;
            self.notify(Notification::PlaylistChanged);
        }

        removed
    }

    /// Move a track to a new position. The cursor follows identity, not
    /// position, so the selected track stays selected.
    pub fn move_track(&mut self, id: TrackId, to_position: usize) -> bool {
        if !self.playlist.move_track(id, to_position) {
            return false;
        }

        // The selection's neighbors changed; re-arm the timers
        self.generation += 1;
        self.kick_preload();
        self.notify(Notification::PlaylistChanged);
        true
    }

    pub fn clear(&mut self) {
        if self.playlist.is_empty() {
            return;
        }

        self.send_command(self.player.stop());
        self.cursor = None;
        self.generation += 1;
        self.playlist.clear();
        self.set_state(PlaybackState::Idle);
        self.notify(Notification::PlaylistChanged);
    }
}

// ==========================
//    WAVEFORMS & PRELOAD
// ==========================
impl Cadenza {
    pub(crate) fn apply_waveform(&mut self, result: WaveformResult) {
        let Some(track) = self.playlist.get_mut(result.id) else {
            log::debug!("discarding waveform for departed track {}", result.id);
            return;
        };

        match result.bars.is_empty() {
            // Analysis failed; leave room for a retry on reselection
            true => track.set_waveform_state(WaveformState::NotStarted),
            false => {
                track.set_waveform_state(WaveformState::Ready(Arc::new(result.bars)));
                self.notify(Notification::TrackUpdated(result.id));
            }
        }
    }

    pub(crate) fn apply_metadata(&mut self, result: MetadataResult) {
        let Some(track) = self.playlist.get_mut(result.id) else {
            log::debug!("discarding metadata for departed track {}", result.id);
            return;
        };

        track.apply_meta(result.meta);
        self.notify(Notification::TrackUpdated(result.id));
    }

    pub(crate) fn handle_preload_due(&mut self, due: PreloadDue) {
        if due.generation != self.generation {
            return; // timer armed under an older selection
        }
        let Some(pos) = self.cursor_position() else {
            return;
        };

        let still_adjacent = (pos + 1..=pos + 2)
            .filter_map(|p| self.playlist.id_at(p))
            .any(|id| id == due.id);
        if !still_adjacent {
            return; // playlist was reshuffled while the timer slept
        }

        self.request_waveform(due.id, JobPriority::Low);
    }

    fn request_waveform(&mut self, id: TrackId, priority: JobPriority) {
        let bar_count = self.config.waveform.bar_count;
        let Some(track) = self.playlist.get_mut(id) else {
            return;
        };
        if track.waveform().is_settled_or_pending() {
            return;
        }

        track.set_waveform_state(WaveformState::Generating);
        self.waveforms.request(
            WaveformJob {
                id,
                path: track.path().to_path_buf(),
                bar_count,
            },
            priority,
        );
    }

    fn kick_preload(&mut self) {
        let Some(pos) = self.cursor_position() else {
            return;
        };

        self.scheduler.schedule(
            self.generation,
            self.playlist.id_at(pos + 1),
            self.playlist.id_at(pos + 2),
        );
    }
}

// ================
//    PROGRESS
// ================
impl Cadenza {
    /// Push a `NowPlaying` snapshot when the elapsed second changed.
    fn publish_progress(&mut self) {
        if !self.state.has_position() {
            return;
        }

        let elapsed = self.player.elapsed();
        if elapsed.as_secs() == self.last_published_secs {
            return;
        }

        self.last_published_secs = elapsed.as_secs();
        self.push_now_playing(elapsed);
    }

    /// Next publish goes out even inside the same second.
    fn force_progress(&mut self) {
        self.last_published_secs = u64::MAX;
        self.publish_progress();
    }

    fn push_now_playing(&mut self, elapsed: Duration) {
        if let Some(info) = self.snapshot_now_playing(elapsed) {
            self.notify(Notification::NowPlaying(info));
        }
    }

    fn snapshot_now_playing(&self, elapsed: Duration) -> Option<NowPlayingInfo> {
        let track = self.current_track()?;
        Some(NowPlayingInfo {
            id: track.id(),
            title: track.title().to_string(),
            elapsed,
            duration: track.duration(),
            is_playing: self.state == PlaybackState::Playing,
        })
    }

    fn notify(&mut self, notification: Notification) {
        self.pending.push(notification);
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            self.state = state;
            self.notify(Notification::PlaybackChanged(state));
        }
    }

    /// Command sends only fail when the playback thread is gone.
    fn send_command(&self, sent: Result<()>) {
        if let Err(e) = sent {
            log::error!("playback thread unreachable: {e}");
        }
    }
}

// ================
//    ACCESSORS
// ================
impl Cadenza {
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn cursor(&self) -> Option<TrackId> {
        self.cursor
    }

    pub fn cursor_position(&self) -> Option<usize> {
        self.cursor.and_then(|id| self.playlist.position_of(id))
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.cursor.and_then(|id| self.playlist.get(id))
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.repeat = mode;
    }

    pub fn cycle_repeat_mode(&mut self) -> RepeatMode {
        self.repeat = self.repeat.next();
        self.repeat
    }

    pub fn elapsed(&self) -> Duration {
        self.player.elapsed()
    }

    /// Hand over and clear the most recent playback error.
    pub fn take_error(&mut self) -> Option<PlayerError> {
        self.last_error.take()
    }

    pub fn now_playing(&self) -> Option<NowPlayingInfo> {
        self.snapshot_now_playing(self.player.elapsed())
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }
}
