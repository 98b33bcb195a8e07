pub mod alarm;
pub mod config;
pub mod countdown;
pub mod format;
pub mod lap;
pub mod stopwatch;
pub mod zone;

pub use alarm::{Alarm, AlarmFiring, AlarmTime, AlarmZone, DaySet, Recurrence, RecurrenceKind};
pub use config::{
    AlarmConfig, ClockConfig, Config, DaemonConfig, DisplaySettings, HourFormat,
    NotificationConfig, Theme, TickConfig,
};
pub use countdown::{CountdownPhase, CountdownStatus, CountdownTick, CountdownTimer};
pub use lap::{LapEntry, LapRecorder, LapStyle};
pub use stopwatch::{Stopwatch, StopwatchStatus};
pub use zone::{TimeZoneEntry, ZoneComparison, ZoneInfo};
