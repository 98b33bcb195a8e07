//! Application configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

use super::zone::parse_zone;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub version: String,
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub display: DisplaySettings,
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub alarm: AlarmConfig,
    #[serde(default)]
    pub ticks: TickConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DaemonConfig {
    pub socket_path: String,
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HourFormat {
    #[default]
    H12,
    H24,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Rendering preferences. Changed at runtime, never written back.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DisplaySettings {
    pub hour_format: HourFormat,
    pub theme: Theme,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClockConfig {
    /// Zones shown when the daemon starts
    pub default_zones: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlarmConfig {
    /// IANA name or `local`, used when an alarm is added without a zone
    pub default_time_zone: String,
}

/// Tick periods in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TickConfig {
    pub clock_ms: u64,
    pub alarm_ms: u64,
    pub countdown_ms: u64,
    pub stopwatch_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationConfig {
    pub enabled: bool,
    pub timeout_ms: u32,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.daemon.validate()?;
        self.clock.validate()?;
        self.alarm.validate()?;
        self.ticks.validate()?;
        self.notifications.validate()?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            daemon: DaemonConfig::default(),
            display: DisplaySettings::default(),
            clock: ClockConfig::default(),
            alarm: AlarmConfig::default(),
            ticks: TickConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}

impl DaemonConfig {
    /// Validate daemon configuration
    pub fn validate(&self) -> Result<()> {
        if self.socket_path.trim().is_empty() {
            return Err(Error::Validation("Socket path cannot be empty".to_string()));
        }

        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            return Err(Error::Validation(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.log_level,
                valid_log_levels.join(", ")
            )));
        }

        Ok(())
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            socket_path: "/tmp/clockwork.sock".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl HourFormat {
    pub fn toggled(self) -> Self {
        match self {
            HourFormat::H12 => HourFormat::H24,
            HourFormat::H24 => HourFormat::H12,
        }
    }
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl ClockConfig {
    pub fn validate(&self) -> Result<()> {
        for name in &self.default_zones {
            parse_zone(name)?;
        }
        Ok(())
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            default_zones: vec![
                "America/New_York".to_string(),
                "Europe/London".to_string(),
            ],
        }
    }
}

impl AlarmConfig {
    pub fn validate(&self) -> Result<()> {
        super::alarm::AlarmZone::parse(&self.default_time_zone)?;
        Ok(())
    }
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            default_time_zone: "local".to_string(),
        }
    }
}

impl TickConfig {
    const MAX_PERIOD_MS: u64 = 60_000;

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("clock_ms", self.clock_ms),
            ("alarm_ms", self.alarm_ms),
            ("countdown_ms", self.countdown_ms),
            ("stopwatch_ms", self.stopwatch_ms),
        ] {
            if value == 0 || value > Self::MAX_PERIOD_MS {
                return Err(Error::Validation(format!(
                    "Tick period {} must be between 1 and {} ms",
                    name,
                    Self::MAX_PERIOD_MS
                )));
            }
        }
        Ok(())
    }

    /// Finest period, used as the scheduler resolution
    pub fn resolution_ms(&self) -> u64 {
        [
            self.clock_ms,
            self.alarm_ms,
            self.countdown_ms,
            self.stopwatch_ms,
        ]
        .into_iter()
        .min()
        .unwrap_or(1000)
    }
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            clock_ms: 1000,
            alarm_ms: 1000,
            countdown_ms: 1000,
            stopwatch_ms: 10,
        }
    }
}

impl NotificationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms > 60_000 {
            return Err(Error::Validation(
                "Notification timeout too long (max 60000 ms)".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: 5000,
        }
    }
}
