use crate::domain::TrackId;
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::{thread, time::Duration};

/// A deferred suggestion to warm one neighbor of the selection.
///
/// Carries the selection generation it was scheduled under so the engine
/// can drop suggestions that outlived the selection they belonged to.
#[derive(Debug, Clone, Copy)]
pub struct PreloadDue {
    pub generation: u64,
    pub id: TrackId,
}

/// Emits `PreloadDue` messages on a delay after each selection.
///
/// Skipping quickly through a playlist must not queue analysis for every
/// track touched on the way, so nothing is suggested until the listener
/// has stayed put for a while: the next track after the short delay, the
/// one beyond it after the long delay. A new selection bumps the
/// generation, which orphans any timers still sleeping.
pub struct PreloadScheduler {
    due: Sender<PreloadDue>,
    next_delay: Duration,
    later_delay: Duration,
}

impl PreloadScheduler {
    pub fn new(due: Sender<PreloadDue>, next_delay: Duration, later_delay: Duration) -> Self {
        PreloadScheduler {
            due,
            next_delay,
            later_delay,
        }
    }

    pub fn channel() -> (Sender<PreloadDue>, Receiver<PreloadDue>) {
        unbounded()
    }

    /// Arm the timers for one selection. `next` and `later` are the tracks
    /// at cursor+1 and cursor+2, when those positions exist.
    pub fn schedule(&self, generation: u64, next: Option<TrackId>, later: Option<TrackId>) {
        if next.is_none() && later.is_none() {
            return;
        }

        let due = self.due.clone();
        let next_delay = self.next_delay;
        let later_delay = self.later_delay;

        thread::spawn(move || {
            thread::sleep(next_delay);
            if let Some(id) = next {
                if due.send(PreloadDue { generation, id }).is_err() {
                    return;
                }
            }

            thread::sleep(later_delay.saturating_sub(next_delay));
            if let Some(id) = later {
                let _ = due.send(PreloadDue { generation, id });
            }
        });
    }
}
