//! Configuration manager
//!
//! The file is read once at startup. Display settings change at runtime but
//! are never written back.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use clockwork_core::{
    Result,
    models::{Config, DisplaySettings, HourFormat, Theme},
    storage::{ConfigStorage, init_config_dir},
};

pub struct ConfigManager {
    storage: Option<ConfigStorage>,
    config: Arc<RwLock<Config>>,
}

impl ConfigManager {
    /// Load from the per-user config directory
    pub fn new() -> Result<Self> {
        let config_dir = init_config_dir()?;
        Self::load(ConfigStorage::new(config_dir))
    }

    /// Load from an explicit file, creating it with defaults if missing
    pub fn from_path(path: PathBuf) -> Result<Self> {
        Self::load(ConfigStorage::at_path(path))
    }

    /// Use an already-built config with no backing file
    pub fn with_config(config: Config) -> Self {
        Self {
            storage: None,
            config: Arc::new(RwLock::new(config)),
        }
    }

    fn load(storage: ConfigStorage) -> Result<Self> {
        let config = storage.load()?;
        tracing::debug!("Loaded config from {}", storage.path().display());

        Ok(Self {
            storage: Some(storage),
            config: Arc::new(RwLock::new(config)),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.storage.as_ref().map(|s| s.path())
    }

    pub async fn get(&self) -> Config {
        self.config.read().await.clone()
    }

    pub async fn display(&self) -> DisplaySettings {
        self.config.read().await.display
    }

    pub async fn hour_format(&self) -> HourFormat {
        self.config.read().await.display.hour_format
    }

    pub async fn set_hour_format(&self, hour_format: HourFormat) -> DisplaySettings {
        self.update_display(|display| display.hour_format = hour_format)
            .await
    }

    pub async fn set_theme(&self, theme: Theme) -> DisplaySettings {
        self.update_display(|display| display.theme = theme).await
    }

    pub async fn toggle_hour_format(&self) -> DisplaySettings {
        self.update_display(|display| display.hour_format = display.hour_format.toggled())
            .await
    }

    pub async fn toggle_theme(&self) -> DisplaySettings {
        self.update_display(|display| display.theme = display.theme.toggled())
            .await
    }

    async fn update_display<F>(&self, change: F) -> DisplaySettings
    where
        F: FnOnce(&mut DisplaySettings),
    {
        let mut config = self.config.write().await;
        change(&mut config.display);
        tracing::info!(
            "Display settings: {:?} hour format, {:?} theme",
            config.display.hour_format,
            config.display.theme
        );
        config.display
    }
}
