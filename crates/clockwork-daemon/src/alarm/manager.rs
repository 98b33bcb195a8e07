//! Alarm scheduler
//!
//! Each alarm carries the next instant it is due. A tick fires every alarm
//! whose instant has passed, so a tick that arrives late still fires.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use clockwork_core::{
    Error, Result,
    models::{Alarm, AlarmFiring, AlarmTime, AlarmZone, Recurrence, RecurrenceKind},
};

use crate::config::ConfigManager;
use crate::event_manager::EventManager;
use crate::events::AlarmEvent;
use crate::notify::{Notifier, deliver};
use crate::scheduler::{Clock, Tick, TickHandle};

/// Input for a new alarm
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewAlarm {
    /// `HH:MM`, 24-hour
    pub time: String,
    #[serde(default)]
    pub recurrence: RecurrenceKind,
    /// IANA name or `local`; the configured default when absent
    #[serde(default)]
    pub time_zone: Option<String>,
    /// Weekdays 0-6 with Sunday as 0, weekly alarms only
    #[serde(default)]
    pub days: Vec<u8>,
}

pub struct AlarmScheduler {
    alarms: RwLock<Vec<Alarm>>,
    config: Arc<ConfigManager>,
    clock: Arc<dyn Clock>,
    event_manager: Arc<EventManager>,
    notifier: Arc<dyn Notifier>,
    ticker: TickHandle,
}

impl AlarmScheduler {
    pub fn new(
        config: Arc<ConfigManager>,
        clock: Arc<dyn Clock>,
        event_manager: Arc<EventManager>,
        notifier: Arc<dyn Notifier>,
        ticker: TickHandle,
    ) -> Self {
        Self {
            alarms: RwLock::new(Vec::new()),
            config,
            clock,
            event_manager,
            notifier,
            ticker,
        }
    }

    pub async fn add(&self, new_alarm: NewAlarm) -> Result<Alarm> {
        let time: AlarmTime = new_alarm.time.parse()?;
        let zone_name = match new_alarm.time_zone {
            Some(name) => name,
            None => self.config.get().await.alarm.default_time_zone,
        };
        let time_zone = AlarmZone::parse(&zone_name)?;
        let recurrence = Recurrence::from_parts(new_alarm.recurrence, &new_alarm.days)?;

        let now = self.clock.now();
        let alarm = Alarm::new(time, time_zone, recurrence, now);

        {
            let mut alarms = self.alarms.write().await;
            alarms.push(alarm.clone());
            self.sync_ticker(&alarms);
        }

        tracing::info!("Added alarm {} at {}", alarm.id, alarm.time);
        self.event_manager
            .emit_alarm(AlarmEvent::added(alarm.clone(), now));

        Ok(alarm)
    }

    /// Alarms in creation order
    pub async fn list(&self) -> Vec<Alarm> {
        self.alarms.read().await.clone()
    }

    pub async fn get(&self, alarm_id: &str) -> Result<Alarm> {
        self.alarms
            .read()
            .await
            .iter()
            .find(|alarm| alarm.id == alarm_id)
            .cloned()
            .ok_or_else(|| not_found(alarm_id))
    }

    pub async fn toggle(&self, alarm_id: &str) -> Result<Alarm> {
        self.update(alarm_id, |alarm, now| {
            alarm.toggle(now);
            Ok(())
        })
        .await
    }

    pub async fn set_recurrence(
        &self,
        alarm_id: &str,
        kind: RecurrenceKind,
        days: &[u8],
    ) -> Result<Alarm> {
        let recurrence = Recurrence::from_parts(kind, days)?;
        self.update(alarm_id, |alarm, now| {
            alarm.set_recurrence(recurrence, now);
            Ok(())
        })
        .await
    }

    pub async fn toggle_day(&self, alarm_id: &str, day: u8) -> Result<Alarm> {
        self.update(alarm_id, |alarm, now| alarm.toggle_day(day, now))
            .await
    }

    /// Removes an alarm. Unknown ids are a no-op.
    pub async fn delete(&self, alarm_id: &str) -> bool {
        {
            let mut alarms = self.alarms.write().await;
            let before = alarms.len();
            alarms.retain(|alarm| alarm.id != alarm_id);
            if alarms.len() == before {
                return false;
            }
            self.sync_ticker(&alarms);
        }

        tracing::info!("Deleted alarm {}", alarm_id);
        self.event_manager
            .emit_alarm(AlarmEvent::deleted(alarm_id.to_string(), self.clock.now()));
        true
    }

    /// Fires every alarm due at `now`, then notifies for each.
    pub async fn check(&self, now: DateTime<Utc>) -> Vec<AlarmFiring> {
        let fired: Vec<(AlarmFiring, Alarm)> = {
            let mut alarms = self.alarms.write().await;
            let fired = alarms
                .iter_mut()
                .filter_map(|alarm| alarm.fire(now).map(|firing| (firing, alarm.clone())))
                .collect();
            self.sync_ticker(&alarms);
            fired
        };

        let mut firings = Vec::with_capacity(fired.len());
        for (firing, alarm) in fired {
            if firing.late_by_seconds > 0 {
                tracing::warn!(
                    "Alarm {} fired {}s late",
                    firing.alarm_id,
                    firing.late_by_seconds
                );
            } else {
                tracing::info!("Alarm {} fired", firing.alarm_id);
            }

            self.event_manager
                .emit_alarm(AlarmEvent::fired(firing.clone(), alarm));
            deliver(
                self.notifier.as_ref(),
                "Alarm",
                &format!("It's {}!", firing.time),
            )
            .await;
            firings.push(firing);
        }

        firings
    }

    async fn update<F>(&self, alarm_id: &str, change: F) -> Result<Alarm>
    where
        F: FnOnce(&mut Alarm, DateTime<Utc>) -> Result<()>,
    {
        let now = self.clock.now();
        let alarm = {
            let mut alarms = self.alarms.write().await;
            let alarm = alarms
                .iter_mut()
                .find(|alarm| alarm.id == alarm_id)
                .ok_or_else(|| not_found(alarm_id))?;
            change(alarm, now)?;
            let updated = alarm.clone();
            self.sync_ticker(&alarms);
            updated
        };

        self.event_manager
            .emit_alarm(AlarmEvent::updated(alarm.clone(), now));
        Ok(alarm)
    }

    fn sync_ticker(&self, alarms: &[Alarm]) {
        if alarms.iter().any(|alarm| alarm.is_active) {
            self.ticker.start();
        } else {
            self.ticker.stop();
        }
    }
}

fn not_found(alarm_id: &str) -> Error {
    Error::NotFound(format!("Alarm not found: {}", alarm_id))
}

impl Tick for AlarmScheduler {
    fn tick(&self, now: DateTime<Utc>) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.check(now).await;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{AlarmEventType, DaemonEvent};
    use crate::notify::MemoryNotifier;
    use crate::scheduler::ManualClock;
    use chrono::{Duration, TimeZone};
    use clockwork_core::models::Config;

    struct Fixture {
        scheduler: AlarmScheduler,
        clock: Arc<ManualClock>,
        events: Arc<EventManager>,
        notifier: Arc<MemoryNotifier>,
        ticker: TickHandle,
    }

    // Monday 2024-01-15 06:00 UTC
    fn fixture() -> Fixture {
        let mut config = Config::default();
        config.alarm.default_time_zone = "UTC".to_string();
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 1, 15, 6, 0, 0).unwrap(),
        ));
        let events = Arc::new(EventManager::new());
        let notifier = Arc::new(MemoryNotifier::granted());
        let ticker = TickHandle::new("alarm", false);
        let scheduler = AlarmScheduler::new(
            Arc::new(ConfigManager::with_config(config)),
            clock.clone(),
            events.clone(),
            notifier.clone(),
            ticker.clone(),
        );
        Fixture {
            scheduler,
            clock,
            events,
            notifier,
            ticker,
        }
    }

    fn once(time: &str) -> NewAlarm {
        NewAlarm {
            time: time.to_string(),
            ..NewAlarm::default()
        }
    }

    #[tokio::test]
    async fn test_add_alarm_uses_default_zone() {
        let f = fixture();

        let alarm = f.scheduler.add(once("07:30")).await.unwrap();

        assert!(alarm.is_active);
        assert_eq!(alarm.recurrence, Recurrence::Once);
        assert_eq!(
            alarm.next_due,
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 7, 30, 0).unwrap())
        );
        assert!(f.ticker.is_active());
    }

    #[tokio::test]
    async fn test_add_alarm_rejects_bad_input() {
        let f = fixture();

        let empty = f.scheduler.add(once("")).await;
        assert!(matches!(empty, Err(Error::Validation(msg)) if msg == "Alarm time cannot be empty"));

        let weekly_without_days = NewAlarm {
            time: "07:30".to_string(),
            recurrence: RecurrenceKind::Weekly,
            ..NewAlarm::default()
        };
        assert!(f.scheduler.add(weekly_without_days).await.is_err());

        let bad_zone = NewAlarm {
            time: "07:30".to_string(),
            time_zone: Some("Nowhere/City".to_string()),
            ..NewAlarm::default()
        };
        assert!(matches!(
            f.scheduler.add(bad_zone).await,
            Err(Error::UnknownTimeZone(_))
        ));

        assert!(f.scheduler.list().await.is_empty());
        assert!(!f.ticker.is_active());
    }

    #[tokio::test]
    async fn test_once_alarm_fires_and_deactivates() {
        let f = fixture();
        let alarm = f.scheduler.add(once("07:30")).await.unwrap();

        f.clock.set(Utc.with_ymd_and_hms(2024, 1, 15, 7, 29, 59).unwrap());
        assert!(f.scheduler.check(f.clock.now()).await.is_empty());

        f.clock.advance(Duration::seconds(1));
        let firings = f.scheduler.check(f.clock.now()).await;
        assert_eq!(firings.len(), 1);
        assert_eq!(firings[0].alarm_id, alarm.id);
        assert_eq!(firings[0].late_by_seconds, 0);

        let stored = f.scheduler.get(&alarm.id).await.unwrap();
        assert!(!stored.is_active);
        assert!(!f.ticker.is_active());

        assert_eq!(f.notifier.shown().len(), 1);
        assert_eq!(f.notifier.shown()[0].title, "Alarm");
        assert_eq!(f.notifier.shown()[0].body, "It's 07:30!");
    }

    #[tokio::test]
    async fn test_late_tick_still_fires() {
        let f = fixture();
        f.scheduler.add(once("07:30")).await.unwrap();

        f.clock.set(Utc.with_ymd_and_hms(2024, 1, 15, 7, 30, 45).unwrap());
        let firings = f.scheduler.check(f.clock.now()).await;

        assert_eq!(firings.len(), 1);
        assert_eq!(firings[0].late_by_seconds, 45);
    }

    #[tokio::test]
    async fn test_daily_alarm_fires_once_per_day() {
        let f = fixture();
        let alarm = f
            .scheduler
            .add(NewAlarm {
                time: "07:30".to_string(),
                recurrence: RecurrenceKind::Daily,
                ..NewAlarm::default()
            })
            .await
            .unwrap();

        f.clock.set(Utc.with_ymd_and_hms(2024, 1, 15, 7, 30, 0).unwrap());
        assert_eq!(f.scheduler.check(f.clock.now()).await.len(), 1);

        // Same minute, next tick: already re-armed for tomorrow
        f.clock.advance(Duration::seconds(1));
        assert!(f.scheduler.check(f.clock.now()).await.is_empty());

        let stored = f.scheduler.get(&alarm.id).await.unwrap();
        assert!(stored.is_active);
        assert_eq!(
            stored.next_due,
            Some(Utc.with_ymd_and_hms(2024, 1, 16, 7, 30, 0).unwrap())
        );
        assert!(f.ticker.is_active());
    }

    #[tokio::test]
    async fn test_weekly_alarm_skips_other_days() {
        let f = fixture();
        let alarm = f
            .scheduler
            .add(NewAlarm {
                time: "07:30".to_string(),
                recurrence: RecurrenceKind::Weekly,
                time_zone: None,
                days: vec![3],
            })
            .await
            .unwrap();

        assert_eq!(
            alarm.next_due,
            Some(Utc.with_ymd_and_hms(2024, 1, 17, 7, 30, 0).unwrap())
        );

        f.clock.set(Utc.with_ymd_and_hms(2024, 1, 15, 7, 30, 0).unwrap());
        assert!(f.scheduler.check(f.clock.now()).await.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_day_keeps_one_day() {
        let f = fixture();
        let alarm = f
            .scheduler
            .add(NewAlarm {
                time: "07:30".to_string(),
                recurrence: RecurrenceKind::Weekly,
                time_zone: None,
                days: vec![1],
            })
            .await
            .unwrap();

        let updated = f.scheduler.toggle_day(&alarm.id, 5).await.unwrap();
        assert_eq!(updated.recurrence.days().unwrap().len(), 2);

        f.scheduler.toggle_day(&alarm.id, 1).await.unwrap();
        let last = f.scheduler.toggle_day(&alarm.id, 5).await;
        assert!(matches!(last, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_set_recurrence_rearms() {
        let f = fixture();
        let alarm = f.scheduler.add(once("05:00")).await.unwrap();
        assert_eq!(
            alarm.next_due,
            Some(Utc.with_ymd_and_hms(2024, 1, 16, 5, 0, 0).unwrap())
        );

        let updated = f
            .scheduler
            .set_recurrence(&alarm.id, RecurrenceKind::Weekly, &[0])
            .await
            .unwrap();
        assert_eq!(
            updated.next_due,
            Some(Utc.with_ymd_and_hms(2024, 1, 21, 5, 0, 0).unwrap())
        );
    }

    #[tokio::test]
    async fn test_toggle_and_delete() {
        let f = fixture();
        let alarm = f.scheduler.add(once("07:30")).await.unwrap();
        let mut receiver = f.events.subscribe();

        let toggled = f.scheduler.toggle(&alarm.id).await.unwrap();
        assert!(!toggled.is_active);
        assert!(toggled.next_due.is_none());
        assert!(!f.ticker.is_active());

        let toggled = f.scheduler.toggle(&alarm.id).await.unwrap();
        assert!(toggled.is_active);
        assert!(f.ticker.is_active());

        assert!(f.scheduler.delete(&alarm.id).await);
        assert!(f.scheduler.list().await.is_empty());
        assert!(!f.ticker.is_active());
        assert!(!f.scheduler.delete(&alarm.id).await);

        let mut kinds = Vec::new();
        while let Ok(DaemonEvent::Alarm(event)) = receiver.try_recv() {
            kinds.push(event.event_type);
        }
        assert!(matches!(kinds.as_slice(), [
            AlarmEventType::Updated,
            AlarmEventType::Updated,
            AlarmEventType::Deleted { .. }
        ]));
    }

    #[tokio::test]
    async fn test_denied_permission_still_fires() {
        let mut f = fixture();
        let denied = Arc::new(MemoryNotifier::denied());
        f.scheduler.notifier = denied.clone() as Arc<dyn Notifier>;
        f.scheduler.add(once("07:30")).await.unwrap();

        f.clock.set(Utc.with_ymd_and_hms(2024, 1, 15, 7, 30, 0).unwrap());
        assert_eq!(f.scheduler.check(f.clock.now()).await.len(), 1);
        assert!(denied.shown().is_empty());
        assert!(f.notifier.shown().is_empty());
    }
}
