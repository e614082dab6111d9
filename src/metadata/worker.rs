use super::{TrackMeta, extract_metadata};
use crate::domain::TrackId;
use crossbeam_channel::{Receiver, Sender, unbounded};
use rayon::prelude::*;
use std::{path::PathBuf, thread};

pub struct MetadataResult {
    pub id: TrackId,
    pub meta: TrackMeta,
}

/// Background tag/format extraction.
///
/// Batches go in, per-track results come back out; a batch is extracted in
/// parallel since files are independent. The worker exits when the service
/// is dropped. Files that cannot be probed at all are logged and yield no
/// result, leaving the track's lazy fields unset.
pub struct MetadataService {
    jobs: Sender<Vec<(TrackId, PathBuf)>>,
    results: Receiver<MetadataResult>,
}

impl MetadataService {
    pub fn spawn() -> Self {
        let (job_tx, job_rx) = unbounded::<Vec<(TrackId, PathBuf)>>();
        let (result_tx, result_rx) = unbounded();

        thread::spawn(move || {
            while let Ok(batch) = job_rx.recv() {
                let extracted: Vec<MetadataResult> = batch
                    .into_par_iter()
                    .filter_map(|(id, path)| match extract_metadata(&path) {
                        Ok(meta) => Some(MetadataResult { id, meta }),
                        Err(e) => {
                            log::warn!("metadata extraction failed for {}: {e}", path.display());
                            None
                        }
                    })
                    .collect();

                for result in extracted {
                    if result_tx.send(result).is_err() {
                        return;
                    }
                }
            }
        });

        MetadataService {
            jobs: job_tx,
            results: result_rx,
        }
    }

    pub fn request(&self, batch: Vec<(TrackId, PathBuf)>) {
        if !batch.is_empty() {
            let _ = self.jobs.send(batch);
        }
    }

    pub fn results(&self) -> &Receiver<MetadataResult> {
        &self.results
    }
}
