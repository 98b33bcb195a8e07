//! Configuration file storage

use crate::{Result, models::Config};
use std::path::{Path, PathBuf};

pub struct ConfigStorage {
    config_path: PathBuf,
}

impl ConfigStorage {
    /// Storage for `config.json` inside `config_dir`
    pub fn new(config_dir: PathBuf) -> Self {
        Self {
            config_path: config_dir.join("config.json"),
        }
    }

    /// Storage for an explicit file path
    pub fn at_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Load the config, writing defaults when the file is missing or empty.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            let config = Config::default();
            self.save(&config)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&self.config_path)?;

        if content.trim().is_empty() {
            let config = Config::default();
            self.save(&config)?;
            return Ok(config);
        }

        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(config)?;
        std::fs::write(&self.config_path, content)?;

        Ok(())
    }
}
