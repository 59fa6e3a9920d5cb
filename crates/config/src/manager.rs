//! Configuration manager - main API for config operations

use crate::persistence::ConfigPersistence;
use crate::{Config, ConfigError, ConfigResult};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.toml";

/// Loads, saves and validates the player configuration file
pub struct ConfigManager {
    persistence: ConfigPersistence,
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Manager for `seamline/config.toml` under the platform config directory
    /// (`~/.config` on Linux, `~/Library/Application Support` on macOS,
    /// `%APPDATA%` on Windows)
    pub fn new() -> ConfigResult<Self> {
        let dirs = ProjectDirs::from("", "", "seamline").ok_or_else(|| {
            ConfigError::NoConfigDir("no home directory for this user".to_string())
        })?;
        Self::with_directory(dirs.config_dir().to_path_buf())
    }

    pub fn with_directory(config_dir: PathBuf) -> ConfigResult<Self> {
        if config_dir.as_os_str().is_empty() {
            return Err(ConfigError::NoConfigDir("empty path".to_string()));
        }
        Ok(Self {
            persistence: ConfigPersistence::new(config_dir.join(CONFIG_FILE)),
            config_dir,
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.persistence.path().to_path_buf()
    }

    /// Missing file yields the defaults; a corrupted file is an error
    pub fn load(&self) -> ConfigResult<Config> {
        self.persistence.load()
    }

    pub fn load_or_default(&self) -> Config {
        self.load().unwrap_or_else(|e| {
            log::warn!("{}; continuing with default config", e);
            Config::default()
        })
    }

    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.persistence.save(config)
    }

    /// Read-modify-write of the config file
    pub fn update<F>(&self, update_fn: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = self.load()?;
        update_fn(&mut config);
        self.save(&config)
    }

    /// Writes the defaults unless a file is already there
    ///
    /// Returns whether a file was written.
    pub fn initialize(&self) -> ConfigResult<bool> {
        let path = self.config_path();
        if path.exists() {
            log::debug!("Keeping existing config at {}", path.display());
            return Ok(false);
        }

        self.save(&Config::default())?;
        log::info!("Wrote default config to {}", path.display());
        Ok(true)
    }

    pub fn reset(&self) -> ConfigResult<()> {
        self.save(&Config::default())
    }

    /// Every validation problem in the file on disk, as display strings
    pub fn validate(&self) -> ConfigResult<Vec<String>> {
        Ok(self
            .load()?
            .validate()
            .err()
            .unwrap_or_default()
            .iter()
            .map(ToString::to_string)
            .collect())
    }

    /// Loads the file and applies `SEAMLINE_PLAYER_*` environment overrides
    ///
    /// Recognized: `SEAMLINE_PLAYER_VOLUME`, `SEAMLINE_PLAYER_GAP_DEVIATION_MS`,
    /// `SEAMLINE_PLAYER_MUTEX`, `SEAMLINE_PLAYER_AUTOPLAY`. Unparseable values are ignored.
    pub fn load_with_env_overrides(&self) -> ConfigResult<Config> {
        let mut config = self.load()?;
        let player = &mut config.player;

        if let Some(v) = env_parse("SEAMLINE_PLAYER_VOLUME") {
            player.volume = v;
        }
        if let Some(v) = env_parse("SEAMLINE_PLAYER_GAP_DEVIATION_MS") {
            player.gap_deviation_ms = v;
        }
        if let Some(v) = env_parse("SEAMLINE_PLAYER_MUTEX") {
            player.mutex = v;
        }
        if let Some(v) = env_parse("SEAMLINE_PLAYER_AUTOPLAY") {
            player.autoplay = v;
        }

        if let Err(errors) = config.validate() {
            for error in errors {
                log::warn!("After environment overrides: {}", error);
            }
        }

        Ok(config)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring unparseable {}={}", key, raw);
            None
        }
    }
}
