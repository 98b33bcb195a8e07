//! Shared tick scheduler
//!
//! One loop drives every periodic component. Each component registers a
//! [`Tick`] target together with a [`TickHandle`]; the handle is the only
//! switch the component flips to start or stop receiving ticks.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, MissedTickBehavior};

use super::clock::Clock;

/// A component that does work on every tick it is due for
pub trait Tick: Send + Sync {
    fn tick(&self, now: DateTime<Utc>) -> BoxFuture<'_, ()>;
}

/// Start/stop switch for one registered tick target
#[derive(Debug, Clone)]
pub struct TickHandle {
    name: &'static str,
    active: Arc<AtomicBool>,
}

impl TickHandle {
    pub fn new(name: &'static str, active: bool) -> Self {
        Self {
            name,
            active: Arc::new(AtomicBool::new(active)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn start(&self) {
        if !self.active.swap(true, Ordering::SeqCst) {
            tracing::debug!("{} ticks started", self.name);
        }
    }

    pub fn stop(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            tracing::debug!("{} ticks stopped", self.name);
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

struct Slot {
    handle: TickHandle,
    period: Duration,
    next_at: Instant,
    target: Arc<dyn Tick>,
}

pub struct Scheduler {
    clock: Arc<dyn Clock>,
    resolution: Duration,
    slots: Mutex<Vec<Slot>>,
}

impl Scheduler {
    pub fn new(clock: Arc<dyn Clock>, resolution: Duration) -> Self {
        Self {
            clock,
            resolution: resolution.max(Duration::from_millis(1)),
            slots: Mutex::new(Vec::new()),
        }
    }

    pub fn resolution(&self) -> Duration {
        self.resolution
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    pub async fn register(&self, handle: TickHandle, period: Duration, target: Arc<dyn Tick>) {
        tracing::debug!(
            "Registered {} ticks every {}ms",
            handle.name(),
            period.as_millis()
        );
        self.slots.lock().await.push(Slot {
            handle,
            period: period.max(Duration::from_millis(1)),
            next_at: Instant::now(),
            target,
        });
    }

    /// Runs every active target whose period has elapsed. Returns how many ran.
    ///
    /// Inactive slots are kept due, so a freshly started component ticks on
    /// the very next pass.
    pub async fn run_once(&self) -> usize {
        let now = Instant::now();
        let due: Vec<Arc<dyn Tick>> = {
            let mut slots = self.slots.lock().await;
            slots
                .iter_mut()
                .filter_map(|slot| {
                    if !slot.handle.is_active() {
                        slot.next_at = now;
                        return None;
                    }
                    if slot.next_at > now {
                        return None;
                    }
                    slot.next_at = now + slot.period;
                    Some(slot.target.clone())
                })
                .collect()
        };

        if due.is_empty() {
            return 0;
        }

        let wall = self.clock.now();
        for target in &due {
            target.tick(wall).await;
        }
        due.len()
    }

    pub async fn run(self: Arc<Self>) {
        tracing::info!(
            "Scheduler running at {}ms resolution",
            self.resolution.as_millis()
        );
        let mut interval = tokio::time::interval(self.resolution);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            self.run_once().await;
        }
    }
}
