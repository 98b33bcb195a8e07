//! Display settings API methods

use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use clockwork_core::models::{DisplaySettings, HourFormat, Theme};

use super::{Result, parse_params};
use crate::config::ConfigManager;
use crate::event_manager::EventManager;
use crate::events::SettingsEvent;
use crate::scheduler::Clock;

/// What a settings change touches
pub struct SettingsContext<'a> {
    pub config: &'a Arc<ConfigManager>,
    pub events: &'a Arc<EventManager>,
    pub clock: &'a dyn Clock,
}

impl SettingsContext<'_> {
    fn changed(&self, settings: DisplaySettings) -> Result<Value> {
        self.events
            .emit_settings(SettingsEvent::changed(settings, self.clock.now()));
        Ok(serde_json::to_value(settings)?)
    }
}

#[derive(Debug, Deserialize)]
struct HourFormatParams {
    hour_format: HourFormat,
}

#[derive(Debug, Deserialize)]
struct ThemeParams {
    theme: Theme,
}

pub async fn get(config: &Arc<ConfigManager>) -> Result<Value> {
    Ok(serde_json::to_value(config.display().await)?)
}

pub async fn set_hour_format(ctx: &SettingsContext<'_>, params: Option<Value>) -> Result<Value> {
    let params: HourFormatParams = parse_params(params)?;
    let settings = ctx.config.set_hour_format(params.hour_format).await;
    ctx.changed(settings)
}

pub async fn set_theme(ctx: &SettingsContext<'_>, params: Option<Value>) -> Result<Value> {
    let params: ThemeParams = parse_params(params)?;
    let settings = ctx.config.set_theme(params.theme).await;
    ctx.changed(settings)
}

pub async fn toggle_hour_format(ctx: &SettingsContext<'_>) -> Result<Value> {
    let settings = ctx.config.toggle_hour_format().await;
    ctx.changed(settings)
}

pub async fn toggle_theme(ctx: &SettingsContext<'_>) -> Result<Value> {
    let settings = ctx.config.toggle_theme().await;
    ctx.changed(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::events::DaemonEvent;
    use crate::scheduler::SystemClock;
    use clockwork_core::models::Config;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_and_toggle() {
        let config = Arc::new(ConfigManager::with_config(Config::default()));
        let events = Arc::new(EventManager::new());
        let mut receiver = events.subscribe();
        let ctx = SettingsContext {
            config: &config,
            events: &events,
            clock: &SystemClock,
        };

        let result = set_hour_format(&ctx, Some(json!({ "hour_format": "h24" })))
            .await
            .unwrap();
        assert_eq!(result["hour_format"], "h24");

        let result = toggle_theme(&ctx).await.unwrap();
        assert_eq!(result["theme"], "dark");

        let current = get(&config).await.unwrap();
        assert_eq!(current, json!({ "hour_format": "h24", "theme": "dark" }));

        assert!(matches!(receiver.recv().await.unwrap(), DaemonEvent::Settings(_)));
    }

    #[tokio::test]
    async fn test_bad_theme_value() {
        let config = Arc::new(ConfigManager::with_config(Config::default()));
        let events = Arc::new(EventManager::new());
        let ctx = SettingsContext {
            config: &config,
            events: &events,
            clock: &SystemClock,
        };

        let result = set_theme(&ctx, Some(json!({ "theme": "sepia" }))).await;
        assert!(matches!(result, Err(ApiError::InvalidParams(_))));
    }
}
