mod analyzer;
mod cache;
mod preload;
mod service;

pub use analyzer::generate_waveform;
pub use cache::WaveformCache;
pub use preload::{PreloadDue, PreloadScheduler};
pub use service::{JobPriority, WaveformJob, WaveformResult, WaveformService};


/// Quietest drawable bar; silence still renders as a visible baseline.
pub(crate) const BAR_FLOOR: f32 = 0.1;
pub(crate) const BAR_CEIL: f32 = 1.0;

/// Threads draining the analysis queues.
pub(crate) const WAVEFORM_WORKERS: usize = 2;
