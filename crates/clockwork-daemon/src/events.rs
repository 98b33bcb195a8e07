use chrono::{DateTime, Utc};
use clockwork_core::models::{
    Alarm, AlarmFiring, DisplaySettings, LapEntry, TimeZoneEntry,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum DaemonEvent {
    Clock(ClockEvent),
    Alarm(AlarmEvent),
    Countdown(CountdownEvent),
    Stopwatch(StopwatchEvent),
    Settings(SettingsEvent),
}

impl DaemonEvent {
    /// JSON-RPC notification method this event is published under
    pub fn method(&self) -> &'static str {
        match self {
            DaemonEvent::Clock(_) => "clock.event",
            DaemonEvent::Alarm(_) => "alarm.event",
            DaemonEvent::Countdown(_) => "countdown.event",
            DaemonEvent::Stopwatch(_) => "stopwatch.event",
            DaemonEvent::Settings(_) => "settings.event",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockEvent {
    pub event_type: ClockEventType,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClockEventType {
    ZonesAdded { zones: Vec<TimeZoneEntry> },
    ZoneRemoved { zone_id: String },
    /// Periodic refresh of every tracked zone
    Tick { zones: Vec<TimeZoneEntry> },
}

impl ClockEvent {
    pub fn zones_added(zones: Vec<TimeZoneEntry>, timestamp: DateTime<Utc>) -> Self {
        Self {
            event_type: ClockEventType::ZonesAdded { zones },
            timestamp,
        }
    }

    pub fn zone_removed(zone_id: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            event_type: ClockEventType::ZoneRemoved { zone_id },
            timestamp,
        }
    }

    pub fn tick(zones: Vec<TimeZoneEntry>, timestamp: DateTime<Utc>) -> Self {
        Self {
            event_type: ClockEventType::Tick { zones },
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmEvent {
    pub event_type: AlarmEventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alarm: Option<Alarm>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AlarmEventType {
    Added,
    Updated,
    Deleted { alarm_id: String },
    Fired { firing: AlarmFiring },
}

impl AlarmEvent {
    pub fn added(alarm: Alarm, timestamp: DateTime<Utc>) -> Self {
        Self {
            event_type: AlarmEventType::Added,
            alarm: Some(alarm),
            timestamp,
        }
    }

    pub fn updated(alarm: Alarm, timestamp: DateTime<Utc>) -> Self {
        Self {
            event_type: AlarmEventType::Updated,
            alarm: Some(alarm),
            timestamp,
        }
    }

    pub fn deleted(alarm_id: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            event_type: AlarmEventType::Deleted { alarm_id },
            alarm: None,
            timestamp,
        }
    }

    pub fn fired(firing: AlarmFiring, alarm: Alarm) -> Self {
        Self {
            timestamp: firing.fired_at,
            event_type: AlarmEventType::Fired { firing },
            alarm: Some(alarm),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CountdownEvent {
    pub event_type: CountdownEventType,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CountdownEventType {
    Configured { total_seconds: u64 },
    Started { remaining_seconds: u64 },
    Paused { remaining_seconds: u64 },
    Tick { remaining_seconds: u64, progress: f64 },
    Lap { lap: LapEntry },
    Completed,
    Reset,
}

impl CountdownEvent {
    pub fn new(event_type: CountdownEventType, timestamp: DateTime<Utc>) -> Self {
        Self {
            event_type,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StopwatchEvent {
    pub event_type: StopwatchEventType,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StopwatchEventType {
    Started { elapsed_ms: u64 },
    Paused { elapsed_ms: u64 },
    Tick { elapsed_ms: u64 },
    Lap { lap: LapEntry },
    Reset,
}

impl StopwatchEvent {
    pub fn new(event_type: StopwatchEventType, timestamp: DateTime<Utc>) -> Self {
        Self {
            event_type,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsEvent {
    pub settings: DisplaySettings,
    pub timestamp: DateTime<Utc>,
}

impl SettingsEvent {
    pub fn changed(settings: DisplaySettings, timestamp: DateTime<Utc>) -> Self {
        Self {
            settings,
            timestamp,
        }
    }
}
