//! Lap recording shared by the countdown and the stopwatch

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::format::{format_centis, format_hms};

/// How lap times are rendered
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LapStyle {
    /// `HH:MM:SS`
    Seconds,
    /// `HH:MM:SS.cc`
    Centis,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LapEntry {
    pub id: String,
    pub number: u32,
    pub cumulative_ms: u64,
    pub split_ms: u64,
    pub cumulative: String,
    pub split: String,
}

/// Append-only lap list measured on its owner's elapsed timeline.
///
/// Marks are elapsed milliseconds rather than wall-clock instants, so time spent
/// paused never shows up in a split.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LapRecorder {
    style: LapStyle,
    laps: Vec<LapEntry>,
    last_mark_ms: u64,
}

impl LapRecorder {
    pub fn new(style: LapStyle) -> Self {
        Self {
            style,
            laps: Vec::new(),
            last_mark_ms: 0,
        }
    }

    /// Record a lap at `elapsed_ms` and move the reference mark there.
    pub fn record(&mut self, elapsed_ms: u64) -> LapEntry {
        let split_ms = elapsed_ms.saturating_sub(self.last_mark_ms);
        let entry = LapEntry {
            id: Uuid::new_v4().to_string(),
            number: self.laps.len() as u32 + 1,
            cumulative_ms: elapsed_ms,
            split_ms,
            cumulative: self.render(elapsed_ms),
            split: self.render(split_ms),
        };

        self.last_mark_ms = elapsed_ms;
        self.laps.push(entry.clone());
        entry
    }

    pub fn laps(&self) -> &[LapEntry] {
        &self.laps
    }

    pub fn clear(&mut self) {
        self.laps.clear();
        self.last_mark_ms = 0;
    }

    fn render(&self, ms: u64) -> String {
        match self.style {
            LapStyle::Seconds => format_hms(ms / 1000),
            LapStyle::Centis => format_centis(ms),
        }
    }
}
