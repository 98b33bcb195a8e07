//! API handlers

pub mod alarm;
pub mod countdown;
pub mod settings;
pub mod stopwatch;
pub mod zone;

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::alarm::AlarmScheduler;
use crate::config::ConfigManager;
use crate::countdown::CountdownManager;
use crate::event_manager::EventManager;
use crate::events::DaemonEvent;
use crate::scheduler::Clock;
use crate::stopwatch::StopwatchManager;
use crate::world_clock::ClockRegistry;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Zone error: {0}")]
    Zone(String),

    #[error("Alarm error: {0}")]
    Alarm(String),

    #[error("Countdown error: {0}")]
    Countdown(String),

    #[error("Stopwatch error: {0}")]
    Stopwatch(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Deserialize required params, reporting shape problems as invalid params
pub(crate) fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T> {
    let params = params.ok_or_else(|| ApiError::InvalidParams("Missing params".to_string()))?;
    serde_json::from_value(params).map_err(|e| ApiError::InvalidParams(e.to_string()))
}

/// Like [`parse_params`] but absent params mean the type's default
pub(crate) fn parse_optional_params<T: DeserializeOwned + Default>(
    params: Option<Value>,
) -> Result<T> {
    match params {
        None | Some(Value::Null) => Ok(T::default()),
        Some(params) => parse_params(Some(params)),
    }
}

/// Routes JSON-RPC methods to the component managers
pub struct ApiHandler {
    event_manager: Arc<EventManager>,
    config_manager: Arc<ConfigManager>,
    clock: Arc<dyn Clock>,
    clock_registry: Arc<ClockRegistry>,
    alarm_scheduler: Arc<AlarmScheduler>,
    countdown_manager: Arc<CountdownManager>,
    stopwatch_manager: Arc<StopwatchManager>,
}

impl ApiHandler {
    pub fn new(
        event_manager: Arc<EventManager>,
        config_manager: Arc<ConfigManager>,
        clock: Arc<dyn Clock>,
        clock_registry: Arc<ClockRegistry>,
        alarm_scheduler: Arc<AlarmScheduler>,
        countdown_manager: Arc<CountdownManager>,
        stopwatch_manager: Arc<StopwatchManager>,
    ) -> Self {
        Self {
            event_manager,
            config_manager,
            clock,
            clock_registry,
            alarm_scheduler,
            countdown_manager,
            stopwatch_manager,
        }
    }

    pub async fn handle(&self, method: &str, params: Option<Value>) -> Result<Value> {
        match method {
            // World clock
            "zone.directory" => zone::directory(params).await,
            "zone.add" => zone::add(&self.clock_registry, params).await,
            "zone.remove" => zone::remove(&self.clock_registry, params).await,
            "zone.list" => zone::list(&self.clock_registry).await,
            "zone.compare" => zone::compare(&self.clock_registry, params).await,

            // Alarms
            "alarm.add" => alarm::add(&self.alarm_scheduler, params).await,
            "alarm.list" => alarm::list(&self.alarm_scheduler).await,
            "alarm.toggle" => alarm::toggle(&self.alarm_scheduler, params).await,
            "alarm.delete" => alarm::delete(&self.alarm_scheduler, params).await,
            "alarm.set_recurrence" => alarm::set_recurrence(&self.alarm_scheduler, params).await,
            "alarm.toggle_day" => alarm::toggle_day(&self.alarm_scheduler, params).await,

            // Countdown
            "countdown.set" => countdown::set(&self.countdown_manager, params).await,
            "countdown.start" => countdown::start(&self.countdown_manager).await,
            "countdown.pause" => countdown::pause(&self.countdown_manager).await,
            "countdown.lap" => countdown::lap(&self.countdown_manager).await,
            "countdown.reset" => countdown::reset(&self.countdown_manager).await,
            "countdown.get" => countdown::get(&self.countdown_manager).await,

            // Stopwatch
            "stopwatch.start" => stopwatch::start(&self.stopwatch_manager).await,
            "stopwatch.pause" => stopwatch::pause(&self.stopwatch_manager).await,
            "stopwatch.lap" => stopwatch::lap(&self.stopwatch_manager).await,
            "stopwatch.reset" => stopwatch::reset(&self.stopwatch_manager).await,
            "stopwatch.get" => stopwatch::get(&self.stopwatch_manager).await,

            // Display settings
            "settings.get" => settings::get(&self.config_manager).await,
            "settings.set_hour_format" => {
                settings::set_hour_format(&self.settings_context(), params).await
            }
            "settings.set_theme" => settings::set_theme(&self.settings_context(), params).await,
            "settings.toggle_hour_format" => {
                settings::toggle_hour_format(&self.settings_context()).await
            }
            "settings.toggle_theme" => settings::toggle_theme(&self.settings_context()).await,

            _ => Err(ApiError::MethodNotFound(method.to_string())),
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<DaemonEvent> {
        self.event_manager.subscribe()
    }

    fn settings_context(&self) -> settings::SettingsContext<'_> {
        settings::SettingsContext {
            config: &self.config_manager,
            events: &self.event_manager,
            clock: self.clock.as_ref(),
        }
    }
}
