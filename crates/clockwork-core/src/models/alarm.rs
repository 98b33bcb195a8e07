//! Recurring alarms
//!
//! Each active alarm carries the UTC instant it is next due. A tick fires every
//! alarm whose instant has passed, then re-arms it, so a late or skipped tick
//! delays a firing instead of losing it.

use crate::{Error, Result};
use chrono::{DateTime, Datelike, Days, Duration, Local, NaiveDateTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::zone::parse_zone;

/// Time of day an alarm rings, `HH:MM`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct AlarmTime {
    pub hour: u32,
    pub minute: u32,
}

impl AlarmTime {
    pub fn new(hour: u32, minute: u32) -> Result<Self> {
        if hour > 23 || minute > 59 {
            return Err(Error::Validation(format!(
                "Invalid alarm time {:02}:{:02}",
                hour, minute
            )));
        }
        Ok(Self { hour, minute })
    }
}

impl FromStr for AlarmTime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::Validation("Alarm time cannot be empty".to_string()));
        }

        let invalid = || Error::Validation(format!("Invalid alarm time '{}', expected HH:MM", s));
        let (hours, minutes) = s.split_once(':').ok_or_else(invalid)?;
        let hour = hours.parse::<u32>().map_err(|_| invalid())?;
        let minute = minutes.parse::<u32>().map_err(|_| invalid())?;
        Self::new(hour, minute)
    }
}

impl TryFrom<String> for AlarmTime {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<AlarmTime> for String {
    fn from(time: AlarmTime) -> Self {
        time.to_string()
    }
}

impl fmt::Display for AlarmTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Zone an alarm's wall-clock time is read in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
pub enum AlarmZone {
    /// Host local time
    Local,
    Named(Tz),
}

impl AlarmZone {
    pub fn parse(name: &str) -> Result<Self> {
        if name.trim().eq_ignore_ascii_case("local") {
            return Ok(AlarmZone::Local);
        }
        Ok(AlarmZone::Named(parse_zone(name)?))
    }
}

impl TryFrom<String> for AlarmZone {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<AlarmZone> for String {
    fn from(zone: AlarmZone) -> Self {
        zone.to_string()
    }
}

impl fmt::Display for AlarmZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlarmZone::Local => f.write_str("local"),
            AlarmZone::Named(tz) => f.write_str(tz.name()),
        }
    }
}

/// Weekday indices 0 (Sunday) through 6 (Saturday)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct DaySet(u8);

impl DaySet {
    pub const fn empty() -> Self {
        Self(0)
    }

    fn check(day: u8) -> Result<()> {
        if day > 6 {
            return Err(Error::Validation(format!(
                "Invalid weekday index {} (0 = Sunday .. 6 = Saturday)",
                day
            )));
        }
        Ok(())
    }

    pub fn contains(&self, day: u8) -> bool {
        day <= 6 && self.0 & (1 << day) != 0
    }

    pub fn contains_weekday(&self, weekday: Weekday) -> bool {
        self.contains(weekday.num_days_from_sunday() as u8)
    }

    pub fn insert(&mut self, day: u8) -> Result<()> {
        Self::check(day)?;
        self.0 |= 1 << day;
        Ok(())
    }

    pub fn remove(&mut self, day: u8) {
        if day <= 6 {
            self.0 &= !(1 << day);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..7u8).filter(|d| self.contains(*d))
    }
}

impl TryFrom<Vec<u8>> for DaySet {
    type Error = Error;

    fn try_from(days: Vec<u8>) -> Result<Self> {
        Self::try_from(days.as_slice())
    }
}

impl TryFrom<&[u8]> for DaySet {
    type Error = Error;

    fn try_from(days: &[u8]) -> Result<Self> {
        let mut set = DaySet::empty();
        for day in days {
            set.insert(*day)?;
        }
        Ok(set)
    }
}

impl From<DaySet> for Vec<u8> {
    fn from(set: DaySet) -> Self {
        set.iter().collect()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceKind {
    #[default]
    Once,
    Daily,
    Weekly,
}

/// Repeat policy. Days exist only on weekly alarms and are never empty there.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Recurrence {
    Once,
    Daily,
    Weekly { days: DaySet },
}

impl Recurrence {
    /// Build from a kind and raw day indices. Days are ignored unless weekly.
    pub fn from_parts(kind: RecurrenceKind, days: &[u8]) -> Result<Self> {
        match kind {
            RecurrenceKind::Once => Ok(Recurrence::Once),
            RecurrenceKind::Daily => Ok(Recurrence::Daily),
            RecurrenceKind::Weekly => {
                let days = DaySet::try_from(days)?;
                if days.is_empty() {
                    return Err(Error::Validation(
                        "A weekly alarm needs at least one day".to_string(),
                    ));
                }
                Ok(Recurrence::Weekly { days })
            }
        }
    }

    pub fn kind(&self) -> RecurrenceKind {
        match self {
            Recurrence::Once => RecurrenceKind::Once,
            Recurrence::Daily => RecurrenceKind::Daily,
            Recurrence::Weekly { .. } => RecurrenceKind::Weekly,
        }
    }

    pub fn days(&self) -> Option<DaySet> {
        match self {
            Recurrence::Weekly { days } => Some(*days),
            _ => None,
        }
    }

    fn allows(&self, weekday: Weekday) -> bool {
        match self {
            Recurrence::Weekly { days } => days.contains_weekday(weekday),
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alarm {
    pub id: String,
    pub time: AlarmTime,
    pub time_zone: AlarmZone,
    pub is_active: bool,
    pub recurrence: Recurrence,
    pub next_due: Option<DateTime<Utc>>,
    pub last_fired: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Record of one alarm going off
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlarmFiring {
    pub alarm_id: String,
    pub time: AlarmTime,
    pub scheduled_for: DateTime<Utc>,
    pub fired_at: DateTime<Utc>,
    pub late_by_seconds: u64,
}

impl Alarm {
    /// Create an active alarm armed for its first occurrence after `now`.
    pub fn new(
        time: AlarmTime,
        time_zone: AlarmZone,
        recurrence: Recurrence,
        now: DateTime<Utc>,
    ) -> Self {
        let mut alarm = Self {
            id: Uuid::new_v4().to_string(),
            time,
            time_zone,
            is_active: true,
            recurrence,
            next_due: None,
            last_fired: None,
            created_at: now,
        };
        alarm.rearm(now);
        alarm
    }

    /// Flip the active flag. Activating re-arms from `now`.
    pub fn toggle(&mut self, now: DateTime<Utc>) -> bool {
        self.is_active = !self.is_active;
        self.rearm(now);
        self.is_active
    }

    pub fn set_recurrence(&mut self, recurrence: Recurrence, now: DateTime<Utc>) {
        self.recurrence = recurrence;
        self.rearm(now);
    }

    /// Add or remove a weekday on a weekly alarm; the last day cannot be removed.
    pub fn toggle_day(&mut self, day: u8, now: DateTime<Utc>) -> Result<()> {
        let Recurrence::Weekly { mut days } = self.recurrence else {
            return Err(Error::InvalidState(
                "Days only apply to weekly alarms".to_string(),
            ));
        };

        if days.contains(day) {
            if days.len() == 1 {
                return Err(Error::Validation(
                    "A weekly alarm needs at least one day".to_string(),
                ));
            }
            days.remove(day);
        } else {
            days.insert(day)?;
        }

        self.set_recurrence(Recurrence::Weekly { days }, now);
        Ok(())
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.next_due.is_some_and(|due| due <= now)
    }

    /// Fire if due. Once alarms switch themselves off; repeating ones re-arm.
    pub fn fire(&mut self, now: DateTime<Utc>) -> Option<AlarmFiring> {
        if !self.is_due(now) {
            return None;
        }
        let scheduled_for = self.next_due?;

        self.last_fired = Some(now);
        match self.recurrence {
            Recurrence::Once => {
                self.is_active = false;
                self.next_due = None;
            }
            Recurrence::Daily | Recurrence::Weekly { .. } => {
                self.next_due = self.next_occurrence(now);
            }
        }

        Some(AlarmFiring {
            alarm_id: self.id.clone(),
            time: self.time,
            scheduled_for,
            fired_at: now,
            late_by_seconds: now
                .signed_duration_since(scheduled_for)
                .num_seconds()
                .max(0) as u64,
        })
    }

    /// Next instant strictly after `after` matching the time and recurrence.
    pub fn next_occurrence(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self.time_zone {
            AlarmZone::Local => next_occurrence_in(&Local, self.time, &self.recurrence, after),
            AlarmZone::Named(tz) => next_occurrence_in(&tz, self.time, &self.recurrence, after),
        }
    }

    fn rearm(&mut self, now: DateTime<Utc>) {
        self.next_due = if self.is_active {
            self.next_occurrence(now)
        } else {
            None
        };
    }
}

fn next_occurrence_in<T: TimeZone>(
    tz: &T,
    time: AlarmTime,
    recurrence: &Recurrence,
    after: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let today = after.with_timezone(tz).date_naive();

    // Eight days always covers the next matching weekday plus today's slot
    for offset in 0..=8 {
        let date = today.checked_add_days(Days::new(offset))?;
        if !recurrence.allows(date.weekday()) {
            continue;
        }

        let naive = date.and_hms_opt(time.hour, time.minute, 0)?;
        if let Some(candidate) = resolve_local(tz, naive)
            && candidate > after
        {
            return Some(candidate);
        }
    }

    None
}

/// Map a local wall time to UTC. Ambiguous times take the earlier instant;
/// times inside a DST gap move to the first valid minute after it.
fn resolve_local<T: TimeZone>(tz: &T, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
        return Some(dt.with_timezone(&Utc));
    }

    (1..=180).find_map(|minutes| {
        tz.from_local_datetime(&(naive + Duration::minutes(minutes)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> AlarmZone {
        AlarmZone::Named(Tz::UTC)
    }

    fn at(day: u32, h: u32, m: u32, s: u32) -> DateTime<Utc> {
        // January 2024: the 15th is a Monday
        Utc.with_ymd_and_hms(2024, 1, day, h, m, s).unwrap()
    }

    fn alarm(time: &str, recurrence: Recurrence, now: DateTime<Utc>) -> Alarm {
        Alarm::new(time.parse().unwrap(), utc(), recurrence, now)
    }

    #[test]
    fn test_parse_alarm_time() {
        let t: AlarmTime = "07:05".parse().unwrap();
        assert_eq!((t.hour, t.minute), (7, 5));
        assert_eq!(t.to_string(), "07:05");

        assert!(matches!("".parse::<AlarmTime>(), Err(Error::Validation(_))));
        assert!("24:00".parse::<AlarmTime>().is_err());
        assert!("12:60".parse::<AlarmTime>().is_err());
        assert!("noon".parse::<AlarmTime>().is_err());
    }

    #[test]
    fn test_alarm_zone_parse() {
        assert_eq!(AlarmZone::parse("local").unwrap(), AlarmZone::Local);
        assert_eq!(
            AlarmZone::parse("Europe/Paris").unwrap().to_string(),
            "Europe/Paris"
        );
        assert!(AlarmZone::parse("Nowhere/Special").is_err());
    }

    #[test]
    fn test_weekly_requires_days() {
        assert!(Recurrence::from_parts(RecurrenceKind::Weekly, &[]).is_err());
        assert!(Recurrence::from_parts(RecurrenceKind::Weekly, &[7]).is_err());

        let weekly = Recurrence::from_parts(RecurrenceKind::Weekly, &[1, 3]).unwrap();
        let days: Vec<u8> = weekly.days().unwrap().into();
        assert_eq!(days, vec![1, 3]);
    }

    #[test]
    fn test_non_weekly_ignores_days() {
        let daily = Recurrence::from_parts(RecurrenceKind::Daily, &[2, 4]).unwrap();
        assert_eq!(daily, Recurrence::Daily);
        assert!(daily.days().is_none());
    }

    #[test]
    fn test_fires_only_at_the_minute() {
        let mut alarm = alarm("14:30", Recurrence::Daily, at(15, 14, 29, 0));
        assert_eq!(alarm.next_due, Some(at(15, 14, 30, 0)));

        assert!(alarm.fire(at(15, 14, 29, 59)).is_none());

        let firing = alarm.fire(at(15, 14, 30, 0)).unwrap();
        assert_eq!(firing.late_by_seconds, 0);
        assert_eq!(firing.time.to_string(), "14:30");

        for s in 1..60 {
            assert!(alarm.fire(at(15, 14, 30, s)).is_none(), "fired again at :{}", s);
        }
        assert!(alarm.fire(at(15, 20, 0, 0)).is_none());
        assert_eq!(alarm.next_due, Some(at(16, 14, 30, 0)));
    }

    #[test]
    fn test_created_inside_minute_waits_for_tomorrow() {
        let alarm = alarm("14:30", Recurrence::Daily, at(15, 14, 30, 20));
        assert_eq!(alarm.next_due, Some(at(16, 14, 30, 0)));
    }

    #[test]
    fn test_late_tick_still_fires_once() {
        let mut alarm = alarm("08:00", Recurrence::Daily, at(15, 7, 0, 0));

        let firing = alarm.fire(at(15, 8, 3, 17)).unwrap();
        assert_eq!(firing.scheduled_for, at(15, 8, 0, 0));
        assert_eq!(firing.late_by_seconds, 197);
        assert!(alarm.fire(at(15, 8, 3, 18)).is_none());
    }

    #[test]
    fn test_once_alarm_deactivates() {
        let mut alarm = alarm("06:00", Recurrence::Once, at(15, 5, 0, 0));
        assert!(alarm.fire(at(15, 6, 0, 0)).is_some());
        assert!(!alarm.is_active);
        assert!(alarm.next_due.is_none());
        assert!(alarm.fire(at(16, 6, 0, 0)).is_none());
    }

    #[test]
    fn test_weekly_skips_other_days() {
        // Wednesday (3) and Friday (5)
        let weekly = Recurrence::from_parts(RecurrenceKind::Weekly, &[3, 5]).unwrap();
        let mut alarm = alarm("09:15", weekly, at(15, 10, 0, 0));
        assert_eq!(alarm.next_due, Some(at(17, 9, 15, 0)));

        alarm.fire(at(17, 9, 15, 0)).unwrap();
        assert_eq!(alarm.next_due, Some(at(19, 9, 15, 0)));

        alarm.fire(at(19, 9, 15, 0)).unwrap();
        assert_eq!(alarm.next_due, Some(at(24, 9, 15, 0)));
    }

    #[test]
    fn test_toggle_twice_restores_state() {
        let now = at(15, 10, 0, 0);
        let mut alarm = alarm("11:00", Recurrence::Daily, now);
        let original = alarm.clone();

        assert!(!alarm.toggle(now));
        assert!(alarm.next_due.is_none());
        assert!(alarm.toggle(now));
        assert_eq!(alarm, original);
    }

    #[test]
    fn test_toggle_day_keeps_one_day() {
        let now = at(15, 10, 0, 0);
        let weekly = Recurrence::from_parts(RecurrenceKind::Weekly, &[1]).unwrap();
        let mut alarm = alarm("11:00", weekly, now);

        assert!(alarm.toggle_day(1, now).is_err());
        alarm.toggle_day(2, now).unwrap();
        alarm.toggle_day(1, now).unwrap();

        let days: Vec<u8> = alarm.recurrence.days().unwrap().into();
        assert_eq!(days, vec![2]);
        // Next Tuesday
        assert_eq!(alarm.next_due, Some(at(16, 11, 0, 0)));
    }

    #[test]
    fn test_toggle_day_on_daily_rejected() {
        let now = at(15, 10, 0, 0);
        let mut alarm = alarm("11:00", Recurrence::Daily, now);
        assert!(matches!(
            alarm.toggle_day(1, now),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_named_zone_offset() {
        let now = at(15, 0, 0, 0);
        let alarm = Alarm::new(
            "09:00".parse().unwrap(),
            AlarmZone::Named(chrono_tz::Asia::Tokyo),
            Recurrence::Daily,
            now,
        );
        // 09:00 in Tokyo is midnight UTC, which is not strictly after now
        assert_eq!(alarm.next_due, Some(at(16, 0, 0, 0)));
    }

    #[test]
    fn test_dst_gap_moves_forward() {
        // 2024-03-10 02:30 does not exist in New York
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 5, 0, 0).unwrap();
        let alarm = Alarm::new(
            "02:30".parse().unwrap(),
            AlarmZone::Named(chrono_tz::America::New_York),
            Recurrence::Daily,
            now,
        );
        // 03:00 EDT
        assert_eq!(
            alarm.next_due,
            Some(Utc.with_ymd_and_hms(2024, 3, 10, 7, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_serde_shape() {
        let weekly = Recurrence::from_parts(RecurrenceKind::Weekly, &[0, 6]).unwrap();
        let alarm = alarm("07:30", weekly, at(15, 0, 0, 0));
        let json = serde_json::to_value(&alarm).unwrap();

        assert_eq!(json["time"], "07:30");
        assert_eq!(json["time_zone"], "UTC");
        assert_eq!(json["recurrence"]["kind"], "weekly");
        assert_eq!(json["recurrence"]["days"], serde_json::json!([0, 6]));

        let back: Alarm = serde_json::from_value(json).unwrap();
        assert_eq!(back, alarm);
    }
}
