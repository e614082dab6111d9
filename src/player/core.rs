use crate::{
    REFRESH_RATE,
    player::{
        CadenzaBackend, CadenzaTrack, PlaybackMetrics, PlaybackState, PlayerCommand, PlayerEvent,
    },
};
use anyhow::Result;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::{
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

pub struct PlayerCore {
    backend: Box<dyn CadenzaBackend>,
    commands: Receiver<PlayerCommand>,
    events: Sender<PlayerEvent>,
    metrics: Arc<PlaybackMetrics>,

    current: Option<CadenzaTrack>,
}

impl PlayerCore {
    /// Start the playback thread. The backend is created on the thread
    /// itself (output streams cannot move between threads); the factory's
    /// result is reported once through `ready` before the loop starts.
    pub(crate) fn spawn<F>(
        make_backend: F,
        commands: Receiver<PlayerCommand>,
        events: Sender<PlayerEvent>,
        metrics: Arc<PlaybackMetrics>,
        ready: Sender<Result<()>>,
    ) -> JoinHandle<()>
    where
        F: FnOnce() -> Result<Box<dyn CadenzaBackend>> + Send + 'static,
    {
        thread::spawn(move || {
            let backend = match make_backend() {
                Ok(backend) => backend,
                Err(e) => {
                    let _ = ready.send(Err(e));
                    return;
                }
            };
            let _ = ready.send(Ok(()));

            let mut core = PlayerCore {
                backend,
                commands,
                events,
                metrics,

                current: None,
            };

            core.run();
        })
    }

    fn run(&mut self) {
        while self.process_commands() {
            self.check_track_end();
            self.update_metrics();
            thread::sleep(REFRESH_RATE);
        }
    }

    /// Drain pending commands. Returns false once the handle is gone and
    /// the thread should wind down.
    fn process_commands(&mut self) -> bool {
        loop {
            match self.commands.try_recv() {
                Ok(cmd) => match cmd {
                    PlayerCommand::Play { track, autoplay } => self.play_track(track, autoplay),
                    PlayerCommand::Pause => self.pause(),
                    PlayerCommand::Resume => self.resume(),
                    PlayerCommand::SeekTo(pos) => self.seek_to(pos),
                    PlayerCommand::Stop => self.stop(),
                },
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    fn check_track_end(&mut self) {
        // Checking `current` ensures the finished event is sent once
        if self.backend.track_ended() {
            if let Some(track) = self.current.take() {
                self.metrics.set_playback_state(PlaybackState::Stopped);
                self.emit(PlayerEvent::TrackFinished(track.id()));
            }
        }
    }

    fn update_metrics(&mut self) {
        if self.current.is_some() {
            self.metrics.set_elapsed(self.backend.position());
        }
    }

    fn play_track(&mut self, track: CadenzaTrack, autoplay: bool) {
        let duration = match self.backend.play(track.path()) {
            Ok(duration) => duration,
            Err(e) => {
                self.current = None;
                self.metrics.set_playback_state(PlaybackState::Failed);
                self.emit(PlayerEvent::TrackFailed {
                    id: track.id(),
                    reason: e.to_string(),
                });
                return;
            }
        };

        if !autoplay {
            self.backend.pause();
        }

        self.metrics.set_elapsed(Duration::ZERO);
        self.metrics.set_playback_state(match autoplay {
            true => PlaybackState::Playing,
            false => PlaybackState::Paused,
        });

        self.emit(PlayerEvent::TrackStarted {
            track: track.clone(),
            autoplay,
            duration,
        });
        self.current = Some(track);
    }

    fn pause(&mut self) {
        if self.current.is_some() {
            self.backend.pause();
            self.metrics.set_playback_state(PlaybackState::Paused);
        }
    }

    fn resume(&mut self) {
        if self.current.is_some() {
            self.backend.resume();
            self.metrics.set_playback_state(PlaybackState::Playing);
        }
    }

    fn seek_to(&mut self, pos: Duration) {
        if self.current.is_some() {
            if let Err(e) = self.backend.seek_to(pos) {
                log::warn!("{e}");
            }
        }
    }

    fn stop(&mut self) {
        self.backend.stop();
        self.current = None;
        self.metrics.reset();
    }

    fn emit(&self, event: PlayerEvent) {
        let _ = self.events.send(event);
    }
}
