//! Parsing and formatting of user-entered times and durations
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.0.0: Extracted from the calendar command handler

use chrono::{DateTime, Utc};

use crate::features::calendar::event::parse_timestamp;

/// Parse a time duration string like "30m", "2h", "1d", "1h30m" into seconds
///
/// Digits without a trailing unit are rejected.
pub fn parse_duration(time_str: &str) -> Option<i64> {
    let time_str = time_str.trim().to_lowercase();
    let mut total_seconds: i64 = 0;
    let mut current_number = String::new();

    for c in time_str.chars() {
        if c.is_ascii_digit() {
            current_number.push(c);
        } else if c.is_whitespace() {
            continue;
        } else if !current_number.is_empty() {
            let value: i64 = current_number.parse().ok()?;
            current_number.clear();

            let unit = match c {
                's' => 1,
                'm' => 60,
                'h' => 60 * 60,
                'd' => 60 * 60 * 24,
                'w' => 60 * 60 * 24 * 7,
                _ => return None,
            };
            total_seconds = total_seconds.checked_add(value.checked_mul(unit)?)?;
        } else {
            return None;
        }
    }

    if !current_number.is_empty() {
        return None;
    }

    if total_seconds > 0 {
        Some(total_seconds)
    } else {
        None
    }
}

/// Format a duration in seconds into a human-readable string
pub fn format_duration(seconds: i64) -> String {
    fn plural(n: i64, unit: &str) -> String {
        format!("{} {}{}", n, unit, if n == 1 { "" } else { "s" })
    }

    if seconds < 60 {
        plural(seconds, "second")
    } else if seconds < 3600 {
        plural(seconds / 60, "minute")
    } else if seconds < 86400 {
        let hours = seconds / 3600;
        let mins = (seconds % 3600) / 60;
        if mins > 0 {
            format!("{} {}", plural(hours, "hour"), plural(mins, "minute"))
        } else {
            plural(hours, "hour")
        }
    } else if seconds % 604800 == 0 {
        plural(seconds / 604800, "week")
    } else {
        let days = seconds / 86400;
        let hours = (seconds % 86400) / 3600;
        if hours > 0 {
            format!("{} {}", plural(days, "day"), plural(hours, "hour"))
        } else {
            plural(days, "day")
        }
    }
}

/// Parse an event start time entered as `YYYY-MM-DD HH:MM` (UTC)
pub fn parse_event_time(input: &str) -> Option<DateTime<Utc>> {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    parse_timestamp(&collapsed)
}
