use crate::error::{PlayerError, PlayerResult};
use std::{
    fs,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

const RECORD_EXT: &str = "wf";

/// File-per-fingerprint waveform store.
///
/// One bincode-encoded bar vector per record, named by the 16-hex-digit
/// fingerprint. Every failure mode reads as a miss, so the directory can
/// be deleted wholesale at any time without breaking anything.
#[derive(Debug, Clone)]
pub struct WaveformCache {
    dir: PathBuf,
}

impl WaveformCache {
    pub fn open<P: AsRef<Path>>(dir: P) -> PlayerResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| PlayerError::CacheIo(e.to_string()))?;
        Ok(WaveformCache { dir })
    }

    fn record_path(&self, fingerprint: u64) -> PathBuf {
        self.dir.join(format!("{fingerprint:016x}.{RECORD_EXT}"))
    }

    /// Fetch the stored bars for a fingerprint. Absence, short reads and
    /// decode failures all come back as `None`; corrupt records are
    /// dropped on sight.
    pub fn load(&self, fingerprint: u64) -> Option<Vec<f32>> {
        let path = self.record_path(fingerprint);
        let raw = fs::read(&path).ok()?;

        match bincode::decode_from_slice(&raw, bincode::config::standard()) {
            Ok((bars, _)) => Some(bars),
            Err(e) => {
                let err = PlayerError::CacheIo(format!(
                    "dropping corrupt record {}: {e}",
                    path.display()
                ));
                log::debug!("{err}");
                let _ = fs::remove_file(&path);
                None
            }
        }
    }

    /// Persist bars for a fingerprint. Failures are logged and swallowed;
    /// the caller keeps its in-memory copy either way.
    pub fn store(&self, fingerprint: u64, bars: &[f32]) {
        if let Err(e) = self.try_store(fingerprint, bars) {
            log::warn!("{e}");
        }
    }

    fn try_store(&self, fingerprint: u64, bars: &[f32]) -> PlayerResult<()> {
        let encoded = bincode::encode_to_vec(bars, bincode::config::standard())
            .map_err(|e| PlayerError::CacheIo(e.to_string()))?;

        // Temp file plus rename, so a crash mid-write never leaves a
        // half-written record at the final name.
        let path = self.record_path(fingerprint);
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, &encoded).map_err(|e| PlayerError::CacheIo(e.to_string()))?;
        fs::rename(&tmp, &path).map_err(|e| PlayerError::CacheIo(e.to_string()))?;

        Ok(())
    }

    /// Remove records whose own mtime has aged past `retention`. Returns
    /// how many were removed. Meant for a background thread at startup;
    /// failures only cost log lines.
    pub fn sweep(&self, retention: Duration) -> usize {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("waveform cache sweep skipped: {e}");
                return 0;
            }
        };

        let now = SystemTime::now();
        let mut removed = 0;

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXT) {
                continue;
            }

            let expired = entry
                .metadata()
                .and_then(|meta| meta.modified())
                .ok()
                .and_then(|mtime| now.duration_since(mtime).ok())
                .is_some_and(|age| age > retention);

            if expired {
                match fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) => log::warn!("could not remove {}: {e}", path.display()),
                }
            }
        }

        removed
    }
}
