//! Component wiring shared by the binary and the integration tests

use std::sync::Arc;
use std::time::Duration;

use clockwork_core::Result;

use crate::alarm::AlarmScheduler;
use crate::api::ApiHandler;
use crate::config::ConfigManager;
use crate::countdown::CountdownManager;
use crate::event_manager::EventManager;
use crate::notify::Notifier;
use crate::scheduler::{Clock, Scheduler, TickHandle};
use crate::stopwatch::StopwatchManager;
use crate::world_clock::ClockRegistry;

pub struct Daemon {
    pub api_handler: Arc<ApiHandler>,
    pub scheduler: Arc<Scheduler>,
    pub event_manager: Arc<EventManager>,
}

impl Daemon {
    /// Build every component, register its ticks and seed the default zones.
    /// Nothing runs until the caller spawns the scheduler.
    pub async fn assemble(
        config_manager: Arc<ConfigManager>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let config = config_manager.get().await;
        let ticks = &config.ticks;

        let event_manager = Arc::new(EventManager::new());
        let scheduler = Arc::new(Scheduler::new(
            clock.clone(),
            Duration::from_millis(ticks.resolution_ms()),
        ));

        let clock_ticker = TickHandle::new("clock", false);
        let clock_registry = Arc::new(ClockRegistry::new(
            config_manager.clone(),
            clock.clone(),
            event_manager.clone(),
            clock_ticker.clone(),
        ));
        scheduler
            .register(
                clock_ticker,
                Duration::from_millis(ticks.clock_ms),
                clock_registry.clone(),
            )
            .await;

        let alarm_ticker = TickHandle::new("alarm", false);
        let alarm_scheduler = Arc::new(AlarmScheduler::new(
            config_manager.clone(),
            clock.clone(),
            event_manager.clone(),
            notifier.clone(),
            alarm_ticker.clone(),
        ));
        scheduler
            .register(
                alarm_ticker,
                Duration::from_millis(ticks.alarm_ms),
                alarm_scheduler.clone(),
            )
            .await;

        let countdown_ticker = TickHandle::new("countdown", false);
        let countdown_manager = Arc::new(CountdownManager::new(
            clock.clone(),
            event_manager.clone(),
            notifier,
            countdown_ticker.clone(),
        ));
        scheduler
            .register(
                countdown_ticker,
                Duration::from_millis(ticks.countdown_ms),
                countdown_manager.clone(),
            )
            .await;

        let stopwatch_ticker = TickHandle::new("stopwatch", false);
        let stopwatch_manager = Arc::new(StopwatchManager::new(
            clock.clone(),
            event_manager.clone(),
            stopwatch_ticker.clone(),
        ));
        scheduler
            .register(
                stopwatch_ticker,
                Duration::from_millis(ticks.stopwatch_ms),
                stopwatch_manager.clone(),
            )
            .await;

        let seeded = clock_registry.add_zones(&config.clock.default_zones).await?;
        tracing::info!("Seeded {} default zone(s)", seeded.len());

        let api_handler = Arc::new(ApiHandler::new(
            event_manager.clone(),
            config_manager,
            clock,
            clock_registry,
            alarm_scheduler,
            countdown_manager,
            stopwatch_manager,
        ));

        Ok(Self {
            api_handler,
            scheduler,
            event_manager,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::MemoryNotifier;
    use crate::scheduler::SystemClock;
    use clockwork_core::models::Config;

    #[tokio::test]
    async fn test_assemble_seeds_default_zones() {
        let config = Arc::new(ConfigManager::with_config(Config::default()));
        let daemon = Daemon::assemble(
            config,
            Arc::new(SystemClock),
            Arc::new(MemoryNotifier::granted()),
        )
        .await
        .unwrap();

        let zones = daemon.api_handler.handle("zone.list", None).await.unwrap();
        let zones = zones["zones"].as_array().unwrap();
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0]["name"], "America/New_York");
        assert_eq!(zones[1]["name"], "Europe/London");
        assert_eq!(daemon.scheduler.resolution(), Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let daemon = Daemon::assemble(
            Arc::new(ConfigManager::with_config(Config::default())),
            Arc::new(SystemClock),
            Arc::new(MemoryNotifier::granted()),
        )
        .await
        .unwrap();

        let result = daemon.api_handler.handle("zone.teleport", None).await;
        assert!(matches!(result, Err(crate::api::ApiError::MethodNotFound(_))));
    }
}
