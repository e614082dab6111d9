use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level player settings loaded from `config.toml`.
///
/// Every field has a default, so a missing file or a partial file is
/// always valid. Default path: `<config dir>/cadenza/config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub waveform: WaveformSettings,
    pub preload: PreloadSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WaveformSettings {
    /// Number of amplitude bars per waveform.
    pub bar_count: usize,
}

impl Default for WaveformSettings {
    fn default() -> Self {
        Self { bar_count: 400 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreloadSettings {
    /// Delay before the track after the current one is analyzed (milliseconds).
    pub next_delay_ms: u64,
    /// Delay before the track two ahead is analyzed (milliseconds).
    pub later_delay_ms: u64,
}

impl Default for PreloadSettings {
    fn default() -> Self {
        Self {
            next_delay_ms: 2_000,
            later_delay_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Waveform cache directory. Defaults to `<cache dir>/cadenza/waveforms`.
    pub directory: Option<PathBuf>,
    /// Cache records untouched for longer than this are removed at startup.
    pub retention_days: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            directory: None,
            retention_days: 7,
        }
    }
}

impl PlayerConfig {
    /// Read settings from the default location, falling back to defaults
    /// when no file exists.
    pub fn load() -> Self {
        match default_config_path() {
            Some(path) if path.is_file() => Self::load_from_file(&path).unwrap_or_else(|e| {
                log::warn!("could not read {}: {e}", path.display());
                Self::default()
            }),
            _ => Self::default(),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.as_ref().display()))?;
        let config = toml::from_str::<PlayerConfig>(&raw)?;
        Ok(config)
    }
}

impl CacheSettings {
    pub fn resolve_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.directory {
            return Ok(dir.clone());
        }

        dirs::cache_dir()
            .map(|dir| dir.join("cadenza").join("waveforms"))
            .context("could not determine a cache directory")
    }

    pub fn retention(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.retention_days * 86_400)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("cadenza").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = PlayerConfig::default();
        assert_eq!(config.waveform.bar_count, 400);
        assert_eq!(config.preload.next_delay_ms, 2_000);
        assert_eq!(config.preload.later_delay_ms, 5_000);
        assert_eq!(config.cache.retention_days, 7);
        assert!(config.cache.directory.is_none());
    }

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[waveform]
bar_count = 120

[cache]
retention_days = 3
"#,
        )
        .unwrap();

        let config = PlayerConfig::load_from_file(&path).unwrap();
        assert_eq!(config.waveform.bar_count, 120);
        assert_eq!(config.cache.retention_days, 3);
        assert_eq!(config.preload.next_delay_ms, 2_000);
    }

    #[test]
    fn explicit_cache_directory_wins() {
        let settings = CacheSettings {
            directory: Some(PathBuf::from("/tmp/waveforms")),
            retention_days: 7,
        };
        assert_eq!(settings.resolve_dir().unwrap(), PathBuf::from("/tmp/waveforms"));
    }

    #[test]
    fn bad_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "waveform = 12").unwrap();
        assert!(PlayerConfig::load_from_file(&path).is_err());
    }
}
