use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_MIN_DELAY_MS: u64 = 1000;
pub const DEFAULT_MAX_DELAY_MS: u64 = 5000;
pub const DEFAULT_MAX_REACTION_MS: u64 = 60_000;
pub const DEFAULT_TICK_RATE_MS: u64 = 16;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("min delay ({min} ms) must not exceed max delay ({max} ms)")]
    InvalidDelayRange { min: u64, max: u64 },
    #[error("max reaction must be greater than zero")]
    ZeroReactionCeiling,
    #[error("tick rate must be greater than zero")]
    ZeroTickRate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub max_reaction_ms: u64,
    pub tick_rate_ms: u64,
    pub reduced_motion: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_delay_ms: DEFAULT_MIN_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            max_reaction_ms: DEFAULT_MAX_REACTION_MS,
            tick_rate_ms: DEFAULT_TICK_RATE_MS,
            reduced_motion: false,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        RoundSettings::try_from(self)?;
        if self.tick_rate_ms == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        Ok(())
    }
}

/// Closed range of whole milliseconds the cue delay is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    min_ms: u64,
    max_ms: u64,
}

impl DelayRange {
    pub fn new(min_ms: u64, max_ms: u64) -> Result<Self, ConfigError> {
        if min_ms > max_ms {
            return Err(ConfigError::InvalidDelayRange {
                min: min_ms,
                max: max_ms,
            });
        }
        Ok(Self { min_ms, max_ms })
    }

    pub fn min_ms(&self) -> u64 {
        self.min_ms
    }

    pub fn max_ms(&self) -> u64 {
        self.max_ms
    }

    pub fn contains(&self, ms: u64) -> bool {
        (self.min_ms..=self.max_ms).contains(&ms)
    }
}

impl Default for DelayRange {
    fn default() -> Self {
        Self {
            min_ms: DEFAULT_MIN_DELAY_MS,
            max_ms: DEFAULT_MAX_DELAY_MS,
        }
    }
}

/// Validated knobs the round state machine runs with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundSettings {
    pub delay: DelayRange,
    /// Samples above this many ms are treated as clock anomalies
    pub max_reaction_ms: f64,
}

impl Default for RoundSettings {
    fn default() -> Self {
        Self {
            delay: DelayRange::default(),
            max_reaction_ms: DEFAULT_MAX_REACTION_MS as f64,
        }
    }
}

impl TryFrom<&Config> for RoundSettings {
    type Error = ConfigError;

    fn try_from(cfg: &Config) -> Result<Self, Self::Error> {
        if cfg.max_reaction_ms == 0 {
            return Err(ConfigError::ZeroReactionCeiling);
        }
        Ok(Self {
            delay: DelayRange::new(cfg.min_delay_ms, cfg.max_delay_ms)?,
            max_reaction_ms: cfg.max_reaction_ms as f64,
        })
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "reflex") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("reflex_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "unreadable config, using defaults");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(std::io::Error::other)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            min_delay_ms: 500,
            max_delay_ms: 2500,
            max_reaction_ms: 10_000,
            tick_rate_ms: 8,
            reduced_motion: true,
        };
        store.save(&cfg).unwrap();
        assert_eq!(cfg, store.load());
    }

    #[test]
    fn missing_or_garbage_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        assert_eq!(store.load(), Config::default());

        fs::write(&path, b"{not json").unwrap();
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{"max_delay_ms": 3000}"#).unwrap();

        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.max_delay_ms, 3000);
        assert_eq!(cfg.min_delay_ms, DEFAULT_MIN_DELAY_MS);
    }

    #[test]
    fn round_settings_from_config() {
        let settings = RoundSettings::try_from(&Config::default()).unwrap();
        assert_eq!(settings, RoundSettings::default());
        assert_eq!(settings.delay.min_ms(), 1000);
        assert_eq!(settings.delay.max_ms(), 5000);
        assert_eq!(settings.max_reaction_ms, 60_000.0);
    }

    #[test]
    fn invalid_configs_rejected() {
        let inverted = Config {
            min_delay_ms: 5000,
            max_delay_ms: 1000,
            ..Config::default()
        };
        assert_eq!(
            inverted.validate(),
            Err(ConfigError::InvalidDelayRange {
                min: 5000,
                max: 1000
            })
        );

        let no_ceiling = Config {
            max_reaction_ms: 0,
            ..Config::default()
        };
        assert_eq!(no_ceiling.validate(), Err(ConfigError::ZeroReactionCeiling));

        let no_tick = Config {
            tick_rate_ms: 0,
            ..Config::default()
        };
        assert_eq!(no_tick.validate(), Err(ConfigError::ZeroTickRate));
    }

    #[test]
    fn delay_range_contains_bounds() {
        let range = DelayRange::default();
        assert!(range.contains(1000));
        assert!(range.contains(5000));
        assert!(!range.contains(999));
        assert!(!range.contains(5001));
        assert!(DelayRange::new(2000, 2000).is_ok());
    }
}
