//! Countdown timer state machine
//!
//! A running countdown stores the instant it ends and derives the remaining time
//! from the wall clock, so late or skipped ticks never accumulate drift.

use crate::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::format::format_hms;
use super::lap::{LapEntry, LapRecorder, LapStyle};

pub const MAX_HOURS: u32 = 99;
pub const MAX_MINUTES: u32 = 59;
pub const MAX_SECONDS: u32 = 59;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CountdownPhase {
    Idle,
    Configured,
    Running,
    Paused,
    Completed,
}

/// Outcome of a single tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CountdownTick {
    Inactive,
    Progress { remaining_seconds: u64, progress: f64 },
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CountdownTimer {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub phase: CountdownPhase,
    pub total_ms: u64,
    remaining_ms: u64,
    ends_at: Option<DateTime<Utc>>,
    laps: LapRecorder,
}

/// Point-in-time view of a countdown
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CountdownStatus {
    pub phase: CountdownPhase,
    pub is_running: bool,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub total_seconds: u64,
    pub remaining_seconds: u64,
    pub progress: f64,
    pub display: String,
    pub laps: Vec<LapEntry>,
}

impl CountdownTimer {
    pub fn new() -> Self {
        Self {
            hours: 0,
            minutes: 0,
            seconds: 0,
            phase: CountdownPhase::Idle,
            total_ms: 0,
            remaining_ms: 0,
            ends_at: None,
            laps: LapRecorder::new(LapStyle::Seconds),
        }
    }

    /// Configure the duration. Out-of-range fields are clamped; a zero total is
    /// rejected and leaves the timer untouched.
    pub fn set_duration(&mut self, hours: u32, minutes: u32, seconds: u32) -> Result<u64> {
        if self.phase == CountdownPhase::Running {
            return Err(Error::InvalidState("Timer is running".to_string()));
        }

        let hours = hours.min(MAX_HOURS);
        let minutes = minutes.min(MAX_MINUTES);
        let seconds = seconds.min(MAX_SECONDS);
        let total_seconds = u64::from(hours) * 3600 + u64::from(minutes) * 60 + u64::from(seconds);

        if total_seconds == 0 {
            return Err(Error::Validation(
                "Duration must be greater than 0".to_string(),
            ));
        }

        self.hours = hours;
        self.minutes = minutes;
        self.seconds = seconds;
        self.total_ms = total_seconds * 1000;
        self.remaining_ms = self.total_ms;
        self.ends_at = None;
        self.phase = CountdownPhase::Configured;
        self.laps.clear();

        Ok(total_seconds)
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> Result<()> {
        match self.phase {
            CountdownPhase::Configured | CountdownPhase::Paused => {
                self.ends_at = Some(now + Duration::milliseconds(self.remaining_ms as i64));
                self.phase = CountdownPhase::Running;
                Ok(())
            }
            CountdownPhase::Running => {
                Err(Error::InvalidState("Timer is already running".to_string()))
            }
            CountdownPhase::Idle => Err(Error::InvalidState("No duration set".to_string())),
            CountdownPhase::Completed => Err(Error::InvalidState(
                "Timer has completed, set or reset it first".to_string(),
            )),
        }
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.phase != CountdownPhase::Running {
            return Err(Error::InvalidState("Timer is not running".to_string()));
        }

        self.remaining_ms = self.remaining_ms_at(now);
        self.ends_at = None;
        self.phase = CountdownPhase::Paused;
        Ok(())
    }

    /// Advance the state machine to `now`.
    pub fn tick(&mut self, now: DateTime<Utc>) -> CountdownTick {
        if self.phase != CountdownPhase::Running {
            return CountdownTick::Inactive;
        }

        if self.remaining_ms_at(now) == 0 {
            self.remaining_ms = 0;
            self.ends_at = None;
            self.phase = CountdownPhase::Completed;
            return CountdownTick::Completed;
        }

        CountdownTick::Progress {
            remaining_seconds: self.remaining_seconds(now),
            progress: self.progress(now),
        }
    }

    pub fn add_lap(&mut self, now: DateTime<Utc>) -> Result<LapEntry> {
        if self.phase != CountdownPhase::Running {
            return Err(Error::InvalidState("Timer is not running".to_string()));
        }
        Ok(self.laps.record(self.elapsed_ms(now)))
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn remaining_ms_at(&self, now: DateTime<Utc>) -> u64 {
        match self.ends_at {
            Some(ends_at) if self.phase == CountdownPhase::Running => {
                ends_at.signed_duration_since(now).num_milliseconds().max(0) as u64
            }
            _ => self.remaining_ms,
        }
    }

    /// Whole seconds left, rounded up so the display reaches zero only on completion.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> u64 {
        self.remaining_ms_at(now).div_ceil(1000)
    }

    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> u64 {
        self.total_ms.saturating_sub(self.remaining_ms_at(now))
    }

    /// Percentage of the total duration elapsed, in [0, 100].
    pub fn progress(&self, now: DateTime<Utc>) -> f64 {
        if self.total_ms == 0 {
            return 0.0;
        }
        (self.elapsed_ms(now) as f64 / self.total_ms as f64 * 100.0).clamp(0.0, 100.0)
    }

    pub fn laps(&self) -> &[LapEntry] {
        self.laps.laps()
    }

    pub fn is_running(&self) -> bool {
        self.phase == CountdownPhase::Running
    }

    pub fn status(&self, now: DateTime<Utc>) -> CountdownStatus {
        let remaining_seconds = self.remaining_seconds(now);
        CountdownStatus {
            phase: self.phase,
            is_running: self.is_running(),
            hours: self.hours,
            minutes: self.minutes,
            seconds: self.seconds,
            total_seconds: self.total_ms / 1000,
            remaining_seconds,
            progress: self.progress(now),
            display: format_hms(remaining_seconds),
            laps: self.laps().to_vec(),
        }
    }
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::new()
    }
}
