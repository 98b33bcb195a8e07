//! Elapsed-time stopwatch

use crate::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::format::format_centis;
use super::lap::{LapEntry, LapRecorder, LapStyle};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stopwatch {
    pub elapsed_ms: u64,
    pub is_running: bool,
    /// `now - elapsed` captured on start; elapsed is always re-derived from it
    started_at: Option<DateTime<Utc>>,
    laps: LapRecorder,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StopwatchStatus {
    pub elapsed_ms: u64,
    pub is_running: bool,
    pub display: String,
    pub laps: Vec<LapEntry>,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self {
            elapsed_ms: 0,
            is_running: false,
            started_at: None,
            laps: LapRecorder::new(LapStyle::Centis),
        }
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.is_running {
            return Err(Error::InvalidState(
                "Stopwatch is already running".to_string(),
            ));
        }

        self.started_at = Some(now - Duration::milliseconds(self.elapsed_ms as i64));
        self.is_running = true;
        Ok(())
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<()> {
        if !self.is_running {
            return Err(Error::InvalidState("Stopwatch is not running".to_string()));
        }

        self.elapsed_ms = self.elapsed_at(now);
        self.started_at = None;
        self.is_running = false;
        Ok(())
    }

    /// Recompute elapsed time from the start anchor.
    pub fn tick(&mut self, now: DateTime<Utc>) -> u64 {
        if self.is_running {
            self.elapsed_ms = self.elapsed_at(now);
        }
        self.elapsed_ms
    }

    pub fn add_lap(&mut self, now: DateTime<Utc>) -> Result<LapEntry> {
        if !self.is_running {
            return Err(Error::InvalidState("Stopwatch is not running".to_string()));
        }
        let elapsed = self.tick(now);
        Ok(self.laps.record(elapsed))
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn elapsed_at(&self, now: DateTime<Utc>) -> u64 {
        match self.started_at {
            Some(started_at) if self.is_running => {
                now.signed_duration_since(started_at)
                    .num_milliseconds()
                    .max(0) as u64
            }
            _ => self.elapsed_ms,
        }
    }

    pub fn laps(&self) -> &[LapEntry] {
        self.laps.laps()
    }

    pub fn status(&self, now: DateTime<Utc>) -> StopwatchStatus {
        let elapsed_ms = self.elapsed_at(now);
        StopwatchStatus {
            elapsed_ms,
            is_running: self.is_running,
            display: format_centis(elapsed_ms),
            laps: self.laps().to_vec(),
        }
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn ms(n: i64) -> Duration {
        Duration::milliseconds(n)
    }

    #[test]
    fn test_elapsed_from_anchor() {
        let mut watch = Stopwatch::new();
        watch.start(t0()).unwrap();
        assert_eq!(watch.tick(t0() + ms(10)), 10);
        // Skipped ticks do not lose time
        assert_eq!(watch.tick(t0() + ms(2_345)), 2_345);
        assert_eq!(watch.status(t0() + ms(2_345)).display, "00:00:02.34");
    }

    #[test]
    fn test_pause_freezes_and_resume_continues() {
        let mut watch = Stopwatch::new();
        watch.start(t0()).unwrap();
        watch.pause(t0() + ms(1_000)).unwrap();

        assert_eq!(watch.tick(t0() + ms(9_000)), 1_000);

        watch.start(t0() + ms(9_000)).unwrap();
        assert_eq!(watch.tick(t0() + ms(9_500)), 1_500);
    }

    #[test]
    fn test_double_start_rejected() {
        let mut watch = Stopwatch::new();
        watch.start(t0()).unwrap();
        assert!(watch.start(t0()).is_err());
    }

    #[test]
    fn test_two_laps_split_sum() {
        let mut watch = Stopwatch::new();
        watch.start(t0()).unwrap();

        let first = watch.add_lap(t0() + ms(1_200)).unwrap();
        let second = watch.add_lap(t0() + ms(3_050)).unwrap();

        assert_eq!(first.split_ms + second.split_ms, second.cumulative_ms);
        assert_eq!(second.cumulative, "00:00:03.05");
        assert_eq!(second.split, "00:00:01.85");
    }

    #[test]
    fn test_pause_excluded_from_split() {
        let mut watch = Stopwatch::new();
        watch.start(t0()).unwrap();
        watch.add_lap(t0() + ms(1_000)).unwrap();
        watch.pause(t0() + ms(2_000)).unwrap();
        watch.start(t0() + ms(60_000)).unwrap();

        let lap = watch.add_lap(t0() + ms(61_000)).unwrap();
        assert_eq!(lap.cumulative_ms, 3_000);
        assert_eq!(lap.split_ms, 2_000);
    }

    #[test]
    fn test_lap_requires_running() {
        let mut watch = Stopwatch::new();
        assert!(watch.add_lap(t0()).is_err());
    }

    #[test]
    fn test_reset() {
        let mut watch = Stopwatch::new();
        watch.start(t0()).unwrap();
        watch.add_lap(t0() + ms(500)).unwrap();
        watch.reset();

        assert_eq!(watch, Stopwatch::new());
        assert_eq!(watch.status(t0() + ms(10_000)).elapsed_ms, 0);
    }
}
