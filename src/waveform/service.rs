use super::{WAVEFORM_WORKERS, WaveformCache, analyzer};
use crate::domain::TrackId;
use crossbeam_channel::{Receiver, Sender, select, unbounded};
use std::{path::PathBuf, thread};

#[derive(Debug, Clone)]
pub struct WaveformJob {
    pub id: TrackId,
    pub path: PathBuf,
    pub bar_count: usize,
}

#[derive(Debug)]
pub struct WaveformResult {
    pub id: TrackId,
    /// Exactly `bar_count` values, or empty when analysis failed.
    pub bars: Vec<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPriority {
    /// The selected track; someone is looking at the empty slot.
    High,
    /// A preloaded neighbor; fills idle worker time.
    Low,
}

/// Fixed pool of analysis workers behind two priority lanes.
///
/// Workers drain the high lane before touching the low lane, consult the
/// cache before decoding, and store fresh results on the way out. They
/// exit when the service is dropped and the lanes disconnect.
pub struct WaveformService {
    high: Sender<WaveformJob>,
    low: Sender<WaveformJob>,
    results: Receiver<WaveformResult>,
}

impl WaveformService {
    pub fn spawn(cache: WaveformCache) -> Self {
        let (high_tx, high_rx) = unbounded::<WaveformJob>();
        let (low_tx, low_rx) = unbounded::<WaveformJob>();
        let (result_tx, result_rx) = unbounded::<WaveformResult>();

        for _ in 0..WAVEFORM_WORKERS {
            let high_rx = high_rx.clone();
            let low_rx = low_rx.clone();
            let result_tx = result_tx.clone();
            let cache = cache.clone();

            thread::spawn(move || worker_loop(cache, high_rx, low_rx, result_tx));
        }

        WaveformService {
            high: high_tx,
            low: low_tx,
            results: result_rx,
        }
    }

    pub fn request(&self, job: WaveformJob, priority: JobPriority) {
        let lane = match priority {
            JobPriority::High => &self.high,
            JobPriority::Low => &self.low,
        };

        if lane.send(job).is_err() {
            log::warn!("waveform workers are gone, dropping request");
        }
    }

    pub fn results(&self) -> &Receiver<WaveformResult> {
        &self.results
    }
}

fn worker_loop(
    cache: WaveformCache,
    high: Receiver<WaveformJob>,
    low: Receiver<WaveformJob>,
    results: Sender<WaveformResult>,
) {
    loop {
        // Selected-track work always beats preload work.
        let job = match high.try_recv() {
            Ok(job) => job,
            Err(_) => {
                select! {
                    recv(high) -> job => match job {
                        Ok(job) => job,
                        Err(_) => return,
                    },
                    recv(low) -> job => match job {
                        Ok(job) => job,
                        Err(_) => return,
                    },
                }
            }
        };

        let bars = run_job(&cache, &job);
        if results.send(WaveformResult { id: job.id, bars }).is_err() {
            return;
        }
    }
}

fn run_job(cache: &WaveformCache, job: &WaveformJob) -> Vec<f32> {
    if let Some(bars) = cache.load(job.id.raw()) {
        // A bar-count change in config invalidates old records.
        if bars.len() == job.bar_count {
            return bars;
        }
    }

    let bars = analyzer::generate_waveform(&job.path, job.bar_count);
    if !bars.is_empty() {
        cache.store(job.id.raw(), &bars);
    }

    bars
}
