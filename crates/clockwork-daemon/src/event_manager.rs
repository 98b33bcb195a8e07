//! Central event broadcasting

use tokio::sync::broadcast;

use crate::events::{
    AlarmEvent, ClockEvent, CountdownEvent, DaemonEvent, SettingsEvent, StopwatchEvent,
};

pub struct EventManager {
    event_tx: broadcast::Sender<DaemonEvent>,
}

impl EventManager {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(1000);
        Self { event_tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DaemonEvent> {
        self.event_tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.event_tx.receiver_count()
    }

    pub fn emit_clock(&self, event: ClockEvent) {
        let _ = self.event_tx.send(DaemonEvent::Clock(event));
    }

    pub fn emit_alarm(&self, event: AlarmEvent) {
        tracing::debug!("Broadcasting alarm event: {:?}", event.event_type);
        let _ = self.event_tx.send(DaemonEvent::Alarm(event));
    }

    pub fn emit_countdown(&self, event: CountdownEvent) {
        let _ = self.event_tx.send(DaemonEvent::Countdown(event));
    }

    pub fn emit_stopwatch(&self, event: StopwatchEvent) {
        let _ = self.event_tx.send(DaemonEvent::Stopwatch(event));
    }

    pub fn emit_settings(&self, event: SettingsEvent) {
        let _ = self.event_tx.send(DaemonEvent::Settings(event));
    }
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new()
    }
}
