//! World clock time zones

use crate::{Error, Result};
use chrono::{DateTime, Offset, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::HourFormat;
use super::format::{format_delta, format_offset};

/// Static metadata for a selectable time zone
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ZoneInfo {
    pub name: &'static str,
    pub city: &'static str,
    pub country: &'static str,
}

const fn zone(name: &'static str, city: &'static str, country: &'static str) -> ZoneInfo {
    ZoneInfo {
        name,
        city,
        country,
    }
}

/// Zones offered for search when adding a world clock card.
pub const DIRECTORY: &[ZoneInfo] = &[
    // North America
    zone("America/New_York", "New York", "United States"),
    zone("America/Los_Angeles", "Los Angeles", "United States"),
    zone("America/Chicago", "Chicago", "United States"),
    zone("America/Denver", "Denver", "United States"),
    zone("America/Phoenix", "Phoenix", "United States"),
    zone("America/Toronto", "Toronto", "Canada"),
    zone("America/Vancouver", "Vancouver", "Canada"),
    zone("America/Montreal", "Montreal", "Canada"),
    zone("America/Mexico_City", "Mexico City", "Mexico"),
    // South America
    zone("America/Sao_Paulo", "São Paulo", "Brazil"),
    zone("America/Buenos_Aires", "Buenos Aires", "Argentina"),
    zone("America/Santiago", "Santiago", "Chile"),
    zone("America/Lima", "Lima", "Peru"),
    zone("America/Bogota", "Bogota", "Colombia"),
    // Europe
    zone("Europe/London", "London", "United Kingdom"),
    zone("Europe/Paris", "Paris", "France"),
    zone("Europe/Berlin", "Berlin", "Germany"),
    zone("Europe/Rome", "Rome", "Italy"),
    zone("Europe/Madrid", "Madrid", "Spain"),
    zone("Europe/Amsterdam", "Amsterdam", "Netherlands"),
    zone("Europe/Brussels", "Brussels", "Belgium"),
    zone("Europe/Vienna", "Vienna", "Austria"),
    zone("Europe/Moscow", "Moscow", "Russia"),
    zone("Europe/Stockholm", "Stockholm", "Sweden"),
    zone("Europe/Oslo", "Oslo", "Norway"),
    zone("Europe/Copenhagen", "Copenhagen", "Denmark"),
    zone("Europe/Dublin", "Dublin", "Ireland"),
    zone("Europe/Helsinki", "Helsinki", "Finland"),
    zone("Europe/Warsaw", "Warsaw", "Poland"),
    zone("Europe/Prague", "Prague", "Czech Republic"),
    // Asia
    zone("Asia/Tokyo", "Tokyo", "Japan"),
    zone("Asia/Shanghai", "Shanghai", "China"),
    zone("Asia/Hong_Kong", "Hong Kong", "China"),
    zone("Asia/Singapore", "Singapore", "Singapore"),
    zone("Asia/Seoul", "Seoul", "South Korea"),
    zone("Asia/Dubai", "Dubai", "UAE"),
    zone("Asia/Bangkok", "Bangkok", "Thailand"),
    zone("Asia/Taipei", "Taipei", "Taiwan"),
    zone("Asia/Manila", "Manila", "Philippines"),
    zone("Asia/Jakarta", "Jakarta", "Indonesia"),
    zone("Asia/Kuala_Lumpur", "Kuala Lumpur", "Malaysia"),
    zone("Asia/Kolkata", "Mumbai", "India"),
    zone("Asia/Karachi", "Karachi", "Pakistan"),
    zone("Asia/Dhaka", "Dhaka", "Bangladesh"),
    // Oceania
    zone("Australia/Sydney", "Sydney", "Australia"),
    zone("Australia/Melbourne", "Melbourne", "Australia"),
    zone("Australia/Brisbane", "Brisbane", "Australia"),
    zone("Australia/Perth", "Perth", "Australia"),
    zone("Pacific/Auckland", "Auckland", "New Zealand"),
    zone("Pacific/Fiji", "Suva", "Fiji"),
    // Africa
    zone("Africa/Cairo", "Cairo", "Egypt"),
    zone("Africa/Lagos", "Lagos", "Nigeria"),
    zone("Africa/Johannesburg", "Johannesburg", "South Africa"),
    zone("Africa/Nairobi", "Nairobi", "Kenya"),
    zone("Africa/Casablanca", "Casablanca", "Morocco"),
];

/// Find directory metadata for an IANA zone name
pub fn lookup(name: &str) -> Option<&'static ZoneInfo> {
    DIRECTORY.iter().find(|z| z.name == name)
}

/// Case-insensitive substring search over city and country
pub fn search(query: &str) -> Vec<&'static ZoneInfo> {
    let query = query.trim().to_lowercase();
    DIRECTORY
        .iter()
        .filter(|z| {
            query.is_empty()
                || z.city.to_lowercase().contains(&query)
                || z.country.to_lowercase().contains(&query)
        })
        .collect()
}

/// Parse an IANA zone identifier
pub fn parse_zone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| Error::UnknownTimeZone(name.to_string()))
}

/// Local hour in [6, 18) counts as day.
pub fn is_daytime(hour: u32) -> bool {
    (6..18).contains(&hour)
}

/// Render a wall-clock time the way the display setting asks for.
pub fn format_clock_time<T: TimeZone>(time: &DateTime<T>, format: HourFormat) -> String
where
    T::Offset: std::fmt::Display,
{
    match format {
        HourFormat::H12 => time.format("%I:%M:%S %p").to_string(),
        HourFormat::H24 => time.format("%H:%M:%S").to_string(),
    }
}

/// A tracked world clock card
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeZoneEntry {
    pub id: String,
    pub name: Tz,
    pub offset: String,
    pub city: String,
    pub country: String,
    pub is_daytime: bool,
    pub current_time: String,
}

impl TimeZoneEntry {
    /// Build an entry for a zone name, validating it first.
    pub fn from_name(name: &str, now: DateTime<Utc>, format: HourFormat) -> Result<Self> {
        let tz = parse_zone(name)?;
        let (city, country) = match lookup(tz.name()) {
            Some(info) => (info.city.to_string(), info.country.to_string()),
            None => (city_from_name(tz.name()), String::new()),
        };

        let mut entry = Self {
            id: Uuid::new_v4().to_string(),
            name: tz,
            offset: String::new(),
            city,
            country,
            is_daytime: false,
            current_time: String::new(),
        };
        entry.refresh(now, format);
        Ok(entry)
    }

    /// Recompute the derived fields for `now`.
    pub fn refresh(&mut self, now: DateTime<Utc>, format: HourFormat) {
        let local = now.with_timezone(&self.name);
        self.offset = format_offset(self.offset_seconds(now));
        self.is_daytime = is_daytime(local.hour());
        self.current_time = format_clock_time(&local, format);
    }

    pub fn offset_seconds(&self, now: DateTime<Utc>) -> i32 {
        now.with_timezone(&self.name).offset().fix().local_minus_utc()
    }
}

fn city_from_name(name: &str) -> String {
    name.rsplit('/').next().unwrap_or(name).replace('_', " ")
}

/// Signed difference between two zones' local times
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ZoneComparison {
    pub from_id: String,
    pub to_id: String,
    pub minutes: i64,
    pub delta: String,
}

impl ZoneComparison {
    /// How far `to` is ahead of `from` at `now`.
    pub fn between(from: &TimeZoneEntry, to: &TimeZoneEntry, now: DateTime<Utc>) -> Self {
        let diff_seconds = i64::from(to.offset_seconds(now)) - i64::from(from.offset_seconds(now));
        let minutes = diff_seconds / 60;
        Self {
            from_id: from.id.clone(),
            to_id: to.id.clone(),
            minutes,
            delta: format_delta(minutes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, h, m, s).unwrap()
    }

    #[test]
    fn test_directory_zones_are_valid() {
        assert!(DIRECTORY.len() >= 50);
        for info in DIRECTORY {
            assert!(parse_zone(info.name).is_ok(), "{} should parse", info.name);
        }
    }

    #[test]
    fn test_search_matches_city_and_country() {
        let results = search("united");
        assert!(results.iter().any(|z| z.city == "New York"));
        assert!(results.iter().any(|z| z.city == "London"));

        let results = search("TOKYO");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Asia/Tokyo");

        assert_eq!(search("").len(), DIRECTORY.len());
        assert!(search("atlantis").is_empty());
    }

    #[test]
    fn test_unknown_zone_rejected() {
        let err = TimeZoneEntry::from_name("Mars/Olympus_Mons", at(12, 0, 0), HourFormat::H24);
        assert!(matches!(err, Err(Error::UnknownTimeZone(_))));
    }

    #[test]
    fn test_entry_from_directory() {
        let entry = TimeZoneEntry::from_name("Asia/Tokyo", at(0, 30, 0), HourFormat::H24).unwrap();
        assert_eq!(entry.city, "Tokyo");
        assert_eq!(entry.country, "Japan");
        assert_eq!(entry.offset, "+09:00");
        assert_eq!(entry.current_time, "09:30:00");
        assert!(entry.is_daytime);
    }

    #[test]
    fn test_entry_outside_directory_derives_city() {
        let entry =
            TimeZoneEntry::from_name("America/Port_of_Spain", at(12, 0, 0), HourFormat::H24)
                .unwrap();
        assert_eq!(entry.city, "Port of Spain");
        assert!(entry.country.is_empty());
    }

    #[test]
    fn test_hour_format() {
        let mut entry = TimeZoneEntry::from_name("UTC", at(14, 5, 9), HourFormat::H12).unwrap();
        assert_eq!(entry.current_time, "02:05:09 PM");

        entry.refresh(at(14, 5, 9), HourFormat::H24);
        assert_eq!(entry.current_time, "14:05:09");
    }

    #[test]
    fn test_day_night_boundaries() {
        assert!(!is_daytime(5));
        assert!(is_daytime(6));
        assert!(is_daytime(17));
        assert!(!is_daytime(18));

        let mut entry = TimeZoneEntry::from_name("UTC", at(5, 59, 59), HourFormat::H24).unwrap();
        assert!(!entry.is_daytime);
        entry.refresh(at(6, 0, 0), HourFormat::H24);
        assert!(entry.is_daytime);
        entry.refresh(at(18, 0, 0), HourFormat::H24);
        assert!(!entry.is_daytime);
    }

    #[test]
    fn test_offset_follows_dst() {
        let entry =
            TimeZoneEntry::from_name("America/New_York", at(12, 0, 0), HourFormat::H24).unwrap();
        assert_eq!(entry.offset, "-05:00");

        let mut summer = entry.clone();
        summer.refresh(Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap(), HourFormat::H24);
        assert_eq!(summer.offset, "-04:00");
    }

    #[test]
    fn test_comparison_is_signed_by_argument_order() {
        let now = at(12, 0, 0);
        let utc = TimeZoneEntry::from_name("UTC", now, HourFormat::H24).unwrap();
        let karachi = TimeZoneEntry::from_name("Asia/Karachi", now, HourFormat::H24).unwrap();

        let forward = ZoneComparison::between(&utc, &karachi, now);
        assert_eq!(forward.minutes, 300);
        assert_eq!(forward.delta, "+5h 0m");

        let backward = ZoneComparison::between(&karachi, &utc, now);
        assert_eq!(backward.delta, "-5h 0m");
    }

    #[test]
    fn test_comparison_with_half_hour_zone() {
        let now = at(12, 0, 0);
        let london = TimeZoneEntry::from_name("Europe/London", now, HourFormat::H24).unwrap();
        let mumbai = TimeZoneEntry::from_name("Asia/Kolkata", now, HourFormat::H24).unwrap();

        assert_eq!(ZoneComparison::between(&london, &mumbai, now).delta, "+5h 30m");
    }

    #[test]
    fn test_entry_ids_unique() {
        let now = at(12, 0, 0);
        let a = TimeZoneEntry::from_name("UTC", now, HourFormat::H24).unwrap();
        let b = TimeZoneEntry::from_name("UTC", now, HourFormat::H24).unwrap();
        assert_ne!(a.id, b.id);
    }
}
