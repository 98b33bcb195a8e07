//! World clock registry
//!
//! Tracks the zones the user added and refreshes their cards every tick.
//! The registry only ticks while at least one zone is tracked.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::RwLock;

use clockwork_core::{
    Error, Result,
    models::{TimeZoneEntry, ZoneComparison, ZoneInfo, zone},
};

use crate::config::ConfigManager;
use crate::event_manager::EventManager;
use crate::events::ClockEvent;
use crate::scheduler::{Clock, Tick, TickHandle};

pub struct ClockRegistry {
    zones: RwLock<Vec<TimeZoneEntry>>,
    config: Arc<ConfigManager>,
    clock: Arc<dyn Clock>,
    event_manager: Arc<EventManager>,
    ticker: TickHandle,
}

impl ClockRegistry {
    pub fn new(
        config: Arc<ConfigManager>,
        clock: Arc<dyn Clock>,
        event_manager: Arc<EventManager>,
        ticker: TickHandle,
    ) -> Self {
        Self {
            zones: RwLock::new(Vec::new()),
            config,
            clock,
            event_manager,
            ticker,
        }
    }

    /// Static zone directory filtered by city or country
    pub fn search(query: &str) -> Vec<&'static ZoneInfo> {
        zone::search(query)
    }

    /// Adds every named zone. Duplicates within one call collapse to one
    /// card. Nothing is added unless every name is valid.
    pub async fn add_zones(&self, names: &[String]) -> Result<Vec<TimeZoneEntry>> {
        let mut unique: Vec<&str> = Vec::new();
        for name in names {
            let name = name.trim();
            if !unique.contains(&name) {
                unique.push(name);
            }
        }

        if unique.is_empty() {
            return Ok(Vec::new());
        }

        let now = self.clock.now();
        let format = self.config.hour_format().await;
        let entries = unique
            .iter()
            .map(|name| TimeZoneEntry::from_name(name, now, format))
            .collect::<Result<Vec<_>>>()?;

        {
            let mut zones = self.zones.write().await;
            zones.extend(entries.iter().cloned());
            self.ticker.start();
        }

        tracing::info!("Added {} world clock zone(s)", entries.len());
        self.event_manager
            .emit_clock(ClockEvent::zones_added(entries.clone(), now));

        Ok(entries)
    }

    /// Removes a card by id. Unknown ids are a no-op.
    pub async fn remove_zone(&self, zone_id: &str) -> bool {
        let removed = {
            let mut zones = self.zones.write().await;
            let before = zones.len();
            zones.retain(|entry| entry.id != zone_id);
            if zones.is_empty() {
                self.ticker.stop();
            }
            zones.len() != before
        };

        if removed {
            tracing::info!("Removed world clock zone {}", zone_id);
            self.event_manager
                .emit_clock(ClockEvent::zone_removed(zone_id.to_string(), self.clock.now()));
        }

        removed
    }

    /// Current cards, freshly computed
    pub async fn list(&self) -> Vec<TimeZoneEntry> {
        self.refresh_all(self.clock.now()).await
    }

    pub async fn len(&self) -> usize {
        self.zones.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.zones.read().await.is_empty()
    }

    /// Local-time difference of `to_id` relative to `from_id`
    pub async fn compare(&self, from_id: &str, to_id: &str) -> Result<ZoneComparison> {
        let zones = self.zones.read().await;
        let find = |id: &str| {
            zones
                .iter()
                .find(|entry| entry.id == id)
                .ok_or_else(|| Error::NotFound(format!("Zone not found: {}", id)))
        };
        let from = find(from_id)?;
        let to = find(to_id)?;

        Ok(ZoneComparison::between(from, to, self.clock.now()))
    }

    /// Refreshed snapshot of every card. Stops the ticker, still under the
    /// lock, once the registry is empty.
    async fn refresh_all(&self, now: DateTime<Utc>) -> Vec<TimeZoneEntry> {
        let format = self.config.hour_format().await;
        let mut zones = self.zones.write().await;
        for entry in zones.iter_mut() {
            entry.refresh(now, format);
        }
        if zones.is_empty() {
            self.ticker.stop();
        }
        zones.clone()
    }
}

impl Tick for ClockRegistry {
    fn tick(&self, now: DateTime<Utc>) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let zones = self.refresh_all(now).await;
            if zones.is_empty() {
                return;
            }
            self.event_manager.emit_clock(ClockEvent::tick(zones, now));
        })
    }
}
