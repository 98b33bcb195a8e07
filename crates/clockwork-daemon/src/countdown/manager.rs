//! Countdown timer manager

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::RwLock;

use clockwork_core::{
    Result,
    models::{CountdownStatus, CountdownTick, CountdownTimer, LapEntry},
};

use crate::event_manager::EventManager;
use crate::events::{CountdownEvent, CountdownEventType};
use crate::notify::{Notifier, deliver};
use crate::scheduler::{Clock, Tick, TickHandle};

pub struct CountdownManager {
    timer: RwLock<CountdownTimer>,
    clock: Arc<dyn Clock>,
    event_manager: Arc<EventManager>,
    notifier: Arc<dyn Notifier>,
    ticker: TickHandle,
}

impl CountdownManager {
    pub fn new(
        clock: Arc<dyn Clock>,
        event_manager: Arc<EventManager>,
        notifier: Arc<dyn Notifier>,
        ticker: TickHandle,
    ) -> Self {
        Self {
            timer: RwLock::new(CountdownTimer::new()),
            clock,
            event_manager,
            notifier,
            ticker,
        }
    }

    pub async fn set_duration(&self, hours: u32, minutes: u32, seconds: u32) -> Result<CountdownStatus> {
        let now = self.clock.now();
        let mut timer = self.timer.write().await;
        let total_seconds = timer.set_duration(hours, minutes, seconds)?;

        tracing::info!("Countdown set to {}s", total_seconds);
        self.emit(CountdownEventType::Configured { total_seconds }, now);
        Ok(timer.status(now))
    }

    pub async fn start(&self) -> Result<CountdownStatus> {
        let now = self.clock.now();
        let mut timer = self.timer.write().await;
        timer.start(now)?;
        self.ticker.start();

        let remaining_seconds = timer.remaining_seconds(now);
        tracing::info!("Countdown started with {}s left", remaining_seconds);
        self.emit(CountdownEventType::Started { remaining_seconds }, now);
        Ok(timer.status(now))
    }

    pub async fn pause(&self) -> Result<CountdownStatus> {
        let now = self.clock.now();
        let mut timer = self.timer.write().await;
        timer.pause(now)?;
        self.ticker.stop();

        let remaining_seconds = timer.remaining_seconds(now);
        tracing::info!("Countdown paused with {}s left", remaining_seconds);
        self.emit(CountdownEventType::Paused { remaining_seconds }, now);
        Ok(timer.status(now))
    }

    pub async fn add_lap(&self) -> Result<LapEntry> {
        let now = self.clock.now();
        let lap = self.timer.write().await.add_lap(now)?;

        tracing::debug!("Countdown lap {} at {}", lap.number, lap.cumulative);
        self.emit(CountdownEventType::Lap { lap: lap.clone() }, now);
        Ok(lap)
    }

    /// Back to idle with no duration and no laps
    pub async fn reset(&self) -> CountdownStatus {
        let now = self.clock.now();
        let mut timer = self.timer.write().await;
        timer.reset();
        self.ticker.stop();

        tracing::info!("Countdown reset");
        self.emit(CountdownEventType::Reset, now);
        timer.status(now)
    }

    pub async fn status(&self) -> CountdownStatus {
        self.timer.read().await.status(self.clock.now())
    }

    fn emit(&self, event_type: CountdownEventType, now: DateTime<Utc>) {
        self.event_manager
            .emit_countdown(CountdownEvent::new(event_type, now));
    }
}

impl Tick for CountdownManager {
    fn tick(&self, now: DateTime<Utc>) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let outcome = {
                let mut timer = self.timer.write().await;
                let outcome = timer.tick(now);
                // Stop under the lock so a concurrent start() cannot be undone
                if matches!(outcome, CountdownTick::Inactive | CountdownTick::Completed) {
                    self.ticker.stop();
                }
                outcome
            };
            match outcome {
                CountdownTick::Inactive => {}
                CountdownTick::Progress {
                    remaining_seconds,
                    progress,
                } => self.emit(
                    CountdownEventType::Tick {
                        remaining_seconds,
                        progress,
                    },
                    now,
                ),
                CountdownTick::Completed => {
                    tracing::info!("Countdown completed");
                    self.emit(CountdownEventType::Completed, now);
                    deliver(
                        self.notifier.as_ref(),
                        "Timer Complete!",
                        "Your timer has finished.",
                    )
                    .await;
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::DaemonEvent;
    use crate::notify::MemoryNotifier;
    use crate::scheduler::ManualClock;
    use chrono::{Duration, TimeZone};
    use clockwork_core::Error;
    use clockwork_core::models::CountdownPhase;

    struct Fixture {
        manager: CountdownManager,
        clock: Arc<ManualClock>,
        events: Arc<EventManager>,
        notifier: Arc<MemoryNotifier>,
        ticker: TickHandle,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
        ));
        let events = Arc::new(EventManager::new());
        let notifier = Arc::new(MemoryNotifier::granted());
        let ticker = TickHandle::new("countdown", false);
        let manager = CountdownManager::new(
            clock.clone(),
            events.clone(),
            notifier.clone(),
            ticker.clone(),
        );
        Fixture {
            manager,
            clock,
            events,
            notifier,
            ticker,
        }
    }

    #[tokio::test]
    async fn test_set_duration_clamps_and_rejects_zero() {
        let f = fixture();

        let status = f.manager.set_duration(120, 75, 90).await.unwrap();
        assert_eq!(status.hours, 99);
        assert_eq!(status.minutes, 59);
        assert_eq!(status.seconds, 59);
        assert_eq!(status.display, "99:59:59");

        assert!(matches!(
            f.manager.set_duration(0, 0, 0).await,
            Err(Error::Validation(_))
        ));
        assert_eq!(f.manager.status().await.total_seconds, 359_999);
    }

    #[tokio::test]
    async fn test_start_requires_duration() {
        let f = fixture();

        assert!(matches!(
            f.manager.start().await,
            Err(Error::InvalidState(_))
        ));
        assert!(!f.ticker.is_active());
    }

    #[tokio::test]
    async fn test_runs_to_completion_and_notifies() {
        let f = fixture();
        f.manager.set_duration(0, 0, 3).await.unwrap();
        f.manager.start().await.unwrap();
        assert!(f.ticker.is_active());

        for expected in [2, 1] {
            f.clock.advance(Duration::seconds(1));
            f.manager.tick(f.clock.now()).await;
            assert_eq!(f.manager.status().await.remaining_seconds, expected);
        }

        f.clock.advance(Duration::seconds(1));
        f.manager.tick(f.clock.now()).await;

        let status = f.manager.status().await;
        assert_eq!(status.phase, CountdownPhase::Completed);
        assert_eq!(status.remaining_seconds, 0);
        assert_eq!(status.progress, 100.0);
        assert!(!f.ticker.is_active());

        let shown = f.notifier.shown();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].title, "Timer Complete!");
        assert_eq!(shown[0].body, "Your timer has finished.");
    }

    #[tokio::test]
    async fn test_pause_freezes_remaining() {
        let f = fixture();
        f.manager.set_duration(0, 1, 0).await.unwrap();
        f.manager.start().await.unwrap();

        f.clock.advance(Duration::seconds(20));
        let paused = f.manager.pause().await.unwrap();
        assert_eq!(paused.remaining_seconds, 40);
        assert!(!f.ticker.is_active());

        f.clock.advance(Duration::minutes(10));
        assert_eq!(f.manager.status().await.remaining_seconds, 40);

        f.manager.start().await.unwrap();
        f.clock.advance(Duration::seconds(5));
        assert_eq!(f.manager.status().await.remaining_seconds, 35);
    }

    #[tokio::test]
    async fn test_set_refused_while_running() {
        let f = fixture();
        f.manager.set_duration(0, 0, 30).await.unwrap();
        f.manager.start().await.unwrap();

        assert!(matches!(
            f.manager.set_duration(0, 0, 10).await,
            Err(Error::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_laps_and_reset() {
        let f = fixture();
        f.manager.set_duration(0, 0, 30).await.unwrap();
        assert!(f.manager.add_lap().await.is_err());

        f.manager.start().await.unwrap();
        f.clock.advance(Duration::seconds(4));
        let first = f.manager.add_lap().await.unwrap();
        f.clock.advance(Duration::seconds(6));
        let second = f.manager.add_lap().await.unwrap();

        assert_eq!(first.split, "00:00:04");
        assert_eq!(second.split, "00:00:06");
        assert_eq!(second.cumulative, "00:00:10");

        let status = f.manager.reset().await;
        assert_eq!(status.phase, CountdownPhase::Idle);
        assert!(status.laps.is_empty());
        assert!(!f.ticker.is_active());
    }

    #[tokio::test]
    async fn test_tick_broadcasts_progress() {
        let f = fixture();
        f.manager.set_duration(0, 0, 10).await.unwrap();
        f.manager.start().await.unwrap();
        let mut receiver = f.events.subscribe();

        f.clock.advance(Duration::seconds(5));
        f.manager.tick(f.clock.now()).await;

        match receiver.recv().await.unwrap() {
            DaemonEvent::Countdown(event) => assert_eq!(
                event.event_type,
                CountdownEventType::Tick {
                    remaining_seconds: 5,
                    progress: 50.0
                }
            ),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_start_racing_an_idle_tick_keeps_ticker() {
        let f = fixture();
        let manager = Arc::new(f.manager);

        for _ in 0..200 {
            manager.reset().await;
            manager.set_duration(0, 1, 0).await.unwrap();
            f.ticker.start();

            let now = f.clock.now();
            let ticking = tokio::spawn({
                let manager = manager.clone();
                async move { manager.tick(now).await }
            });
            let starting = tokio::spawn({
                let manager = manager.clone();
                async move { manager.start().await }
            });
            ticking.await.unwrap();
            starting.await.unwrap().unwrap();

            assert!(manager.status().await.is_running);
            assert!(f.ticker.is_active());
        }
    }
}
