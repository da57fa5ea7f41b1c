//! Calendar event model and its persisted record layout
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Reject leads and repeat counts outside the representable range
//! - 1.1.0: Validate stored rows through `EventRecord` instead of positional tuples
//! - 1.0.0: Initial event model with reminder and recurrence state

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use thiserror::Error;

use crate::core::truncate_chars;

/// Storage format for `scheduled_at` (minute precision, always UTC)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Longest description quoted in a reminder DM
pub const MAX_REMINDER_DESCRIPTION_CHARS: usize = 1500;

/// Discord user snowflake of the event owner
pub type OwnerId = u64;

/// A stored row that could not be turned into a [`CalendarEvent`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed event record '{name}' (owner {owner_id}): {reason}")]
pub struct MalformedRecord {
    pub name: String,
    pub owner_id: i64,
    pub reason: String,
}

/// One scheduled event owned by one user
///
/// `(name, owner_id)` is the identity of an event. `reminded` always refers to
/// the occurrence currently held in `scheduled_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub name: String,
    pub owner_id: OwnerId,
    pub scheduled_at: DateTime<Utc>,
    pub description: Option<String>,
    pub reminder_lead: Duration,
    pub repeat_interval: Option<Duration>,
    pub max_repeats: Option<u32>,
    pub repeat_count: u32,
    pub reminded: bool,
}

impl CalendarEvent {
    /// Create a one-off event with no reminder lead
    pub fn new(name: impl Into<String>, owner_id: OwnerId, scheduled_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            owner_id,
            scheduled_at,
            description: None,
            reminder_lead: Duration::zero(),
            repeat_interval: None,
            max_repeats: None,
            repeat_count: 0,
            reminded: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_reminder_lead(mut self, lead: Duration) -> Self {
        self.reminder_lead = lead;
        self
    }

    /// Make the event recur every `interval`, at most `max_repeats` times
    pub fn with_repeat(mut self, interval: Duration, max_repeats: Option<u32>) -> Self {
        self.repeat_interval = Some(interval);
        self.max_repeats = max_repeats;
        self
    }

    /// Moment the reminder for the current occurrence becomes due
    ///
    /// Clamped to the earliest representable instant for leads reaching past it.
    pub fn remind_at(&self) -> DateTime<Utc> {
        self.scheduled_at
            .checked_sub_signed(self.reminder_lead)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// True when the reminder is due and has not been sent for this occurrence
    pub fn reminder_due(&self, now: DateTime<Utc>) -> bool {
        !self.reminded && self.remind_at() <= now
    }

    /// True once the current occurrence has started
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.scheduled_at <= now
    }

    /// Next occurrence time and repeat count, or `None` if the event is spent
    ///
    /// Anchored on the current `scheduled_at`, never on the wall clock.
    pub fn next_occurrence(&self) -> Option<(DateTime<Utc>, u32)> {
        let interval = self.repeat_interval?;
        if let Some(max) = self.max_repeats {
            if self.repeat_count >= max {
                return None;
            }
        }
        let next_at = self.scheduled_at.checked_add_signed(interval)?;
        Some((next_at, self.repeat_count.checked_add(1)?))
    }

    /// Text delivered to the owner when the reminder fires
    pub fn reminder_message(&self) -> String {
        let mut text = format!("🔔 Reminder: Your event `{}` is about to start!", self.name);
        if let Some(description) = self.description.as_deref().filter(|d| !d.trim().is_empty()) {
            let quoted = truncate_chars(description, MAX_REMINDER_DESCRIPTION_CHARS);
            text.push_str(&format!("\n> {quoted}"));
        }
        text
    }
}

/// Format a timestamp the way it is persisted
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a persisted timestamp, interpreting it as UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Row of the `events` table, column for column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub name: String,
    pub scheduled_at: String,
    pub owner_id: i64,
    pub description: Option<String>,
    pub reminder_lead_minutes: Option<i64>,
    pub repeat_interval_seconds: Option<i64>,
    pub max_repeats: Option<i64>,
    pub repeat_count: i64,
    pub reminded: bool,
}

impl From<&CalendarEvent> for EventRecord {
    fn from(event: &CalendarEvent) -> Self {
        EventRecord {
            name: event.name.clone(),
            scheduled_at: format_timestamp(event.scheduled_at),
            owner_id: event.owner_id as i64,
            description: event.description.clone(),
            reminder_lead_minutes: Some(event.reminder_lead.num_minutes()),
            repeat_interval_seconds: event.repeat_interval.map(|d| d.num_seconds()),
            max_repeats: event.max_repeats.map(i64::from),
            repeat_count: i64::from(event.repeat_count),
            reminded: event.reminded,
        }
    }
}

impl TryFrom<EventRecord> for CalendarEvent {
    type Error = MalformedRecord;

    fn try_from(record: EventRecord) -> Result<Self, Self::Error> {
        let malformed = |reason: String| MalformedRecord {
            name: record.name.clone(),
            owner_id: record.owner_id,
            reason,
        };

        let owner_id = u64::try_from(record.owner_id)
            .map_err(|_| malformed("negative owner id".to_string()))?;

        let scheduled_at = parse_timestamp(&record.scheduled_at).ok_or_else(|| {
            malformed(format!("unparseable timestamp '{}'", record.scheduled_at))
        })?;

        let lead_minutes = record.reminder_lead_minutes.unwrap_or(0);
        if lead_minutes < 0 {
            return Err(malformed(format!("negative reminder lead {lead_minutes}")));
        }
        let reminder_lead = Duration::try_minutes(lead_minutes)
            .filter(|lead| scheduled_at.checked_sub_signed(*lead).is_some())
            .ok_or_else(|| malformed(format!("reminder lead {lead_minutes} out of range")))?;

        // Zero interval means "does not repeat", like NULL
        let repeat_interval = match record.repeat_interval_seconds {
            None | Some(0) => None,
            Some(secs) if secs < 0 => {
                return Err(malformed(format!("negative repeat interval {secs}")));
            }
            Some(secs) => Some(
                Duration::try_seconds(secs)
                    .ok_or_else(|| malformed(format!("repeat interval {secs} out of range")))?,
            ),
        };

        let max_repeats = match record.max_repeats {
            None => None,
            Some(max) => Some(
                u32::try_from(max).map_err(|_| malformed(format!("invalid max repeats {max}")))?,
            ),
        };

        let repeat_count = u32::try_from(record.repeat_count)
            .ok()
            .filter(|count| *count < u32::MAX)
            .ok_or_else(|| malformed(format!("invalid repeat count {}", record.repeat_count)))?;
        if let Some(max) = max_repeats {
            if repeat_count > max {
                return Err(malformed(format!(
                    "repeat count {repeat_count} exceeds max repeats {max}"
                )));
            }
        }

        Ok(CalendarEvent {
            name: record.name,
            owner_id,
            scheduled_at,
            description: record.description,
            reminder_lead,
            repeat_interval,
            max_repeats,
            repeat_count,
            reminded: record.reminded,
        })
    }
}
