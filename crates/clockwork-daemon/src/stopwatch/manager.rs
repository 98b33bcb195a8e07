//! Stopwatch manager

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::RwLock;

use clockwork_core::{
    Result,
    models::{LapEntry, Stopwatch, StopwatchStatus},
};

use crate::event_manager::EventManager;
use crate::events::{StopwatchEvent, StopwatchEventType};
use crate::scheduler::{Clock, Tick, TickHandle};

pub struct StopwatchManager {
    stopwatch: RwLock<Stopwatch>,
    clock: Arc<dyn Clock>,
    event_manager: Arc<EventManager>,
    ticker: TickHandle,
}

impl StopwatchManager {
    pub fn new(clock: Arc<dyn Clock>, event_manager: Arc<EventManager>, ticker: TickHandle) -> Self {
        Self {
            stopwatch: RwLock::new(Stopwatch::new()),
            clock,
            event_manager,
            ticker,
        }
    }

    pub async fn start(&self) -> Result<StopwatchStatus> {
        let now = self.clock.now();
        let mut stopwatch = self.stopwatch.write().await;
        stopwatch.start(now)?;
        self.ticker.start();

        let elapsed_ms = stopwatch.elapsed_at(now);
        tracing::info!("Stopwatch started at {}ms", elapsed_ms);
        self.emit(StopwatchEventType::Started { elapsed_ms }, now);
        Ok(stopwatch.status(now))
    }

    pub async fn pause(&self) -> Result<StopwatchStatus> {
        let now = self.clock.now();
        let mut stopwatch = self.stopwatch.write().await;
        stopwatch.pause(now)?;
        self.ticker.stop();

        let elapsed_ms = stopwatch.elapsed_ms;
        tracing::info!("Stopwatch paused at {}ms", elapsed_ms);
        self.emit(StopwatchEventType::Paused { elapsed_ms }, now);
        Ok(stopwatch.status(now))
    }

    pub async fn add_lap(&self) -> Result<LapEntry> {
        let now = self.clock.now();
        let lap = self.stopwatch.write().await.add_lap(now)?;
        self.emit(StopwatchEventType::Lap { lap: lap.clone() }, now);
        Ok(lap)
    }

    pub async fn reset(&self) -> StopwatchStatus {
        let now = self.clock.now();
        let mut stopwatch = self.stopwatch.write().await;
        stopwatch.reset();
        self.ticker.stop();

        tracing::info!("Stopwatch reset");
        self.emit(StopwatchEventType::Reset, now);
        stopwatch.status(now)
    }

    pub async fn status(&self) -> StopwatchStatus {
        self.stopwatch.read().await.status(self.clock.now())
    }

    fn emit(&self, event_type: StopwatchEventType, now: DateTime<Utc>) {
        self.event_manager
            .emit_stopwatch(StopwatchEvent::new(event_type, now));
    }
}

impl Tick for StopwatchManager {
    fn tick(&self, now: DateTime<Utc>) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let (running, elapsed_ms) = {
                let mut stopwatch = self.stopwatch.write().await;
                let elapsed_ms = stopwatch.tick(now);
                if !stopwatch.is_running {
                    self.ticker.stop();
                }
                (stopwatch.is_running, elapsed_ms)
            };

            if !running {
                return;
            }
            self.emit(StopwatchEventType::Tick { elapsed_ms }, now);
        })
    }
}
