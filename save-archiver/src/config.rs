//! Configuration management for the save archiver.
//!
//! Loads configuration from a TOML file; every field has a default, so an
//! empty file (or none at all) targets Dragon's Dogma saves on Steam.

use crate::archive::BackupNaming;
use crate::discovery::DEFAULT_APP_ID;
use crate::utils::{ArchiverError, Result};
use crate::watcher::Baseline;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub game: GameConfig,
    pub steam: SteamConfig,
    pub watch: WatchConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Live save name without extension; may not contain '-'
    pub base_name: String,

    /// Live save extension, including the leading dot
    pub extension: String,

    /// Steam app id the saves live under
    pub app_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SteamConfig {
    /// Steam installation; probed from common locations when unset
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Seconds between modification checks
    pub poll_interval_secs: u64,

    /// Where the high-water mark starts
    pub baseline: BaselineSetting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaselineSetting {
    /// Only archive writes made after the watcher starts
    Now,
    /// Only archive writes newer than the save's current time
    Current,
    /// Archive the current save on the first poll
    Epoch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

// Default values
fn default_base_name() -> String {
    "DDDA".to_string()
}

fn default_extension() -> String {
    ".sav".to_string()
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            base_name: default_base_name(),
            extension: default_extension(),
            app_id: DEFAULT_APP_ID.to_string(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            baseline: BaselineSetting::Now,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl From<BaselineSetting> for Baseline {
    fn from(setting: BaselineSetting) -> Self {
        match setting {
            BaselineSetting::Now => Baseline::Now,
            BaselineSetting::Current => Baseline::Current,
            BaselineSetting::Epoch => Baseline::At(UNIX_EPOCH),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| ArchiverError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.watch.poll_interval_secs == 0 {
            return Err(ArchiverError::Config(
                "watch.poll_interval_secs must be at least 1".to_string(),
            ));
        }
        self.naming()?;
        Ok(())
    }

    /// Backup naming for the configured game
    pub fn naming(&self) -> Result<BackupNaming> {
        BackupNaming::new(&self.game.base_name, &self.game.extension)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.watch.poll_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.naming().unwrap().primary_name(), "DDDA.sav");
        assert_eq!(config.game.app_id, "367500");
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.watch.baseline, BaselineSetting::Now);
        assert_eq!(config.log.level, "info");
        assert!(config.steam.path.is_none());
    }

    #[test]
    fn test_partial_file() {
        let config = Config::from_toml(
            r#"
            [watch]
            poll_interval_secs = 2
            baseline = "epoch"

            [steam]
            path = "/opt/steam"
            "#,
        )
        .unwrap();

        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(Baseline::from(config.watch.baseline), Baseline::At(UNIX_EPOCH));
        assert_eq!(config.steam.path, Some(PathBuf::from("/opt/steam")));
        assert_eq!(config.game.base_name, "DDDA");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Config::from_toml("[watch]\npoll_interval_secs = 0\n").is_err());
        assert!(matches!(
            Config::from_toml("[game]\nbase_name = \"my-save\"\n"),
            Err(ArchiverError::InvalidBaseName(_))
        ));
        assert!(matches!(
            Config::from_toml("[watch]\nbaseline = \"later\"\n"),
            Err(ArchiverError::Config(_))
        ));
    }

    #[test]
    fn test_from_file() -> Result<()> {
        let temp_dir = tempfile::TempDir::new()?;
        let path = temp_dir.path().join("archiver.toml");
        std::fs::write(&path, "[log]\nlevel = \"debug\"\n")?;

        assert_eq!(Config::from_file(&path)?.log.level, "debug");

        Ok(())
    }
}
