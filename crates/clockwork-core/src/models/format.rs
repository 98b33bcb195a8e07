//! Display formatting for durations and offsets

/// Format whole seconds as `HH:MM:SS`.
pub fn format_hms(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Format milliseconds as `HH:MM:SS.cc` (centiseconds, truncated).
pub fn format_centis(ms: u64) -> String {
    let centis = (ms % 1000) / 10;
    format!("{}.{:02}", format_hms(ms / 1000), centis)
}

/// Format a UTC offset in seconds as `+HH:MM` / `-HH:MM`.
pub fn format_offset(offset_seconds: i32) -> String {
    let sign = if offset_seconds < 0 { '-' } else { '+' };
    let abs = offset_seconds.unsigned_abs();
    format!("{}{:02}:{:02}", sign, abs / 3600, (abs % 3600) / 60)
}

/// Format a signed minute delta as `+Hh Mm` / `-Hh Mm`.
pub fn format_delta(minutes: i64) -> String {
    let sign = if minutes < 0 { '-' } else { '+' };
    let abs = minutes.unsigned_abs();
    format!("{}{}h {}m", sign, abs / 60, abs % 60)
}
