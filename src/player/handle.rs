use crate::player::{
    CadenzaBackend, CadenzaTrack, PlaybackMetrics, PlaybackState, PlayerCommand, PlayerEvent,
    RodioBackend, core::PlayerCore,
};
use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use std::{sync::Arc, time::Duration};

/// Owning side of the playback thread.
///
/// Commands go down a channel, events come back up another, and the
/// metrics block is shared for cheap progress reads. Dropping the handle
/// disconnects the command channel, which shuts the thread down.
pub struct PlayerHandle {
    commands: Sender<PlayerCommand>,
    events: Receiver<PlayerEvent>,
    metrics: Arc<PlaybackMetrics>,
}

impl PlayerHandle {
    /// Spawn the playback thread against the default audio device.
    pub fn spawn() -> Result<Self> {
        Self::spawn_with(|| -> Result<Box<dyn CadenzaBackend>> {
            Ok(Box::new(RodioBackend::new()?))
        })
    }

    /// Spawn the playback thread with a caller-supplied backend factory.
    /// The factory runs on the playback thread, so backends holding
    /// thread-bound resources work here.
    pub fn spawn_with<F>(make_backend: F) -> Result<Self>
    where
        F: FnOnce() -> Result<Box<dyn CadenzaBackend>> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = unbounded();
        let (evt_tx, evt_rx) = unbounded();
        let (ready_tx, ready_rx) = bounded(1);
        let metrics = PlaybackMetrics::new();

        PlayerCore::spawn(make_backend, cmd_rx, evt_tx, Arc::clone(&metrics), ready_tx);
        ready_rx
            .recv()
            .context("playback thread died during startup")??;

        Ok(PlayerHandle {
            commands: cmd_tx,
            events: evt_rx,
            metrics,
        })
    }
}

// =====================
//    COMMAND HANDLER
// =====================
impl PlayerHandle {
    pub fn play(&self, track: CadenzaTrack, autoplay: bool) -> Result<()> {
        self.commands.send(PlayerCommand::Play { track, autoplay })?;
        Ok(())
    }

    pub fn pause(&self) -> Result<()> {
        self.commands.send(PlayerCommand::Pause)?;
        Ok(())
    }

    pub fn resume(&self) -> Result<()> {
        self.commands.send(PlayerCommand::Resume)?;
        Ok(())
    }

    pub fn seek_to(&self, pos: Duration) -> Result<()> {
        self.commands.send(PlayerCommand::SeekTo(pos))?;
        Ok(())
    }

    pub fn stop(&self) -> Result<()> {
        self.commands.send(PlayerCommand::Stop)?;
        Ok(())
    }
}

// ===============
//    ACCESSORS
// ===============
impl PlayerHandle {
    pub fn metrics(&self) -> Arc<PlaybackMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn events(&self) -> &Receiver<PlayerEvent> {
        &self.events
    }

    pub fn elapsed(&self) -> Duration {
        self.metrics.get_elapsed()
    }

    pub fn get_playback_state(&self) -> PlaybackState {
        self.metrics.get_state()
    }
}
