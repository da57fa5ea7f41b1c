//! Calendar command handlers
//!
//! Handles: add_event, remove_event, events
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.2.0: Cap description length so reminders fit in one DM
//! - 1.1.0: Recurrence options on /add_event, chunked /events output
//! - 1.0.0: Initial add/remove/list commands

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::prelude::Context;
use std::sync::Arc;

use super::respond;
use crate::commands::context::CommandContext;
use crate::commands::handler::SlashCommandHandler;
use crate::commands::slash::{get_integer_option, get_string_option};
use crate::core::{chunk_for_message, format_duration, parse_duration, parse_event_time, truncate_chars};
use crate::features::calendar::event::format_timestamp;
use crate::features::calendar::{CalendarEvent, EventStore, OwnerId, StoreError};

/// Longest accepted event name, in characters
const MAX_NAME_CHARS: usize = 100;
/// Longest accepted description, in characters
const MAX_DESCRIPTION_CHARS: usize = 1000;
/// Longest reminder lead accepted by /add_event (one year)
const MAX_REMINDER_MINUTES: i64 = 525_600;
/// Description preview length in /events
const DESCRIPTION_PREVIEW_CHARS: usize = 120;

/// Options of an /add_event invocation, before validation
#[derive(Debug, Default, Clone)]
pub struct AddEventOptions {
    pub name: Option<String>,
    pub when: Option<String>,
    pub description: Option<String>,
    pub reminder_minutes: Option<i64>,
    pub repeat: Option<String>,
    pub max_repeats: Option<i64>,
}

impl AddEventOptions {
    fn from_command(command: &ApplicationCommandInteraction) -> Self {
        let options = &command.data.options;
        Self {
            name: get_string_option(options, "name"),
            when: get_string_option(options, "when"),
            description: get_string_option(options, "description"),
            reminder_minutes: get_integer_option(options, "reminder_minutes"),
            repeat: get_string_option(options, "repeat"),
            max_repeats: get_integer_option(options, "max_repeats"),
        }
    }

    /// Validate the options into a new event for `owner_id`
    ///
    /// The error is a message meant for the user.
    pub fn into_event(self, owner_id: OwnerId) -> std::result::Result<CalendarEvent, String> {
        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or("❌ Please give the event a name.")?;
        if name.chars().count() > MAX_NAME_CHARS {
            return Err(format!(
                "❌ Event names can be at most {MAX_NAME_CHARS} characters."
            ));
        }

        let when = self.when.unwrap_or_default();
        let scheduled_at = parse_event_time(&when).ok_or_else(|| {
            format!("❌ Couldn't read `{when}` as a time. Use `YYYY-MM-DD HH:MM` in UTC, e.g. `2024-01-31 09:30`.")
        })?;

        let mut event = CalendarEvent::new(name, owner_id, scheduled_at);

        if let Some(description) = self.description.map(|d| d.trim().to_string()) {
            if description.chars().count() > MAX_DESCRIPTION_CHARS {
                return Err(format!(
                    "❌ Descriptions can be at most {MAX_DESCRIPTION_CHARS} characters."
                ));
            }
            if !description.is_empty() {
                event = event.with_description(description);
            }
        }

        if let Some(minutes) = self.reminder_minutes {
            if !(0..=MAX_REMINDER_MINUTES).contains(&minutes) {
                return Err(format!(
                    "❌ Reminder lead must be between 0 and {MAX_REMINDER_MINUTES} minutes."
                ));
            }
            event = event.with_reminder_lead(Duration::minutes(minutes));
        }

        match self.repeat {
            Some(raw) => {
                let seconds = parse_duration(&raw).ok_or_else(|| {
                    format!("❌ Invalid repeat `{raw}`. Use formats like `12h`, `1d`, `1w` or `1h30m`.")
                })?;
                if seconds < 60 || seconds % 60 != 0 {
                    return Err("❌ Repeat intervals must be a whole number of minutes.".to_string());
                }
                let max_repeats = match self.max_repeats {
                    Some(max) if max < 1 => {
                        return Err("❌ `max_repeats` must be at least 1.".to_string());
                    }
                    Some(max) => Some(
                        u32::try_from(max).map_err(|_| "❌ `max_repeats` is too large.".to_string())?,
                    ),
                    None => None,
                };
                event = event.with_repeat(Duration::seconds(seconds), max_repeats);
            }
            None if self.max_repeats.is_some() => {
                return Err("❌ `max_repeats` only applies together with `repeat`.".to_string());
            }
            None => {}
        }

        Ok(event)
    }
}

/// Confirmation shown after an event was stored
pub fn format_confirmation(event: &CalendarEvent, now: DateTime<Utc>) -> String {
    let mut text = format!(
        "📅 Scheduled **{}** for {} UTC",
        event.name,
        format_timestamp(event.scheduled_at)
    );

    let lead = event.reminder_lead.num_seconds();
    if lead > 0 {
        text.push_str(&format!("\n⏰ I'll DM you {} before it starts.", format_duration(lead)));
    } else {
        text.push_str("\n⏰ I'll DM you when it starts.");
    }

    if let Some(interval) = event.repeat_interval {
        text.push_str(&format!("\n🔁 Repeats every {}", format_duration(interval.num_seconds())));
        match event.max_repeats {
            Some(1) => text.push_str(" (once more)"),
            Some(max) => text.push_str(&format!(" ({max} more times)")),
            None => {}
        }
    }

    if event.scheduled_at <= now {
        text.push_str("\n⚠️ That time has already passed, so the reminder goes out right away.");
    }

    text
}

/// Render a user's events, earliest first
pub fn format_event_list(events: &[CalendarEvent], now: DateTime<Utc>) -> String {
    if events.is_empty() {
        return "📋 You don't have any events.\n\nUse `/add_event <name> <when>` to create one!"
            .to_string();
    }

    let mut list = String::from("📋 **Your Events:**\n");

    for event in events {
        let until = event.scheduled_at.signed_duration_since(now).num_seconds();
        let relative = if until > 0 {
            format!("in {}", format_duration(until))
        } else {
            "any moment now".to_string()
        };

        list.push_str(&format!(
            "\n**{}** - {} UTC ({relative})\n",
            event.name,
            format_timestamp(event.scheduled_at)
        ));

        let mut details = Vec::new();
        let lead = event.reminder_lead.num_seconds();
        if lead > 0 {
            details.push(format!("⏰ {} before", format_duration(lead)));
        }
        if event.reminded {
            details.push("✅ reminded".to_string());
        }
        if let Some(interval) = event.repeat_interval {
            let mut repeat = format!("🔁 every {}", format_duration(interval.num_seconds()));
            if let Some(max) = event.max_repeats {
                repeat.push_str(&format!(" ({}/{max})", event.repeat_count));
            }
            details.push(repeat);
        }
        if !details.is_empty() {
            list.push_str(&details.join(" · "));
            list.push('\n');
        }

        if let Some(description) = &event.description {
            list.push_str(&format!(
                "> {}\n",
                truncate_chars(description, DESCRIPTION_PREVIEW_CHARS)
            ));
        }
    }

    list.push_str("\n*Use `/remove_event <name>` to delete an event.*");
    list
}

/// Handler for calendar commands
pub struct CalendarHandler;

#[async_trait]
impl SlashCommandHandler for CalendarHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["add_event", "remove_event", "events"]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        match command.data.name.as_str() {
            "add_event" => self.handle_add_event(&ctx, serenity_ctx, command).await,
            "remove_event" => self.handle_remove_event(&ctx, serenity_ctx, command).await,
            "events" => self.handle_events(&ctx, serenity_ctx, command).await,
            _ => Ok(()),
        }
    }
}

impl CalendarHandler {
    /// Handle /add_event - validate and store a new event
    async fn handle_add_event(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let owner_id = command.user.id.0;

        let event = match AddEventOptions::from_command(command).into_event(owner_id) {
            Ok(event) => event,
            Err(message) => return respond(serenity_ctx, command, &message).await,
        };

        match ctx.database.insert(&event).await {
            Ok(()) => {
                info!(
                    "Created event '{}' for user {owner_id} at {}",
                    event.name,
                    format_timestamp(event.scheduled_at)
                );
                respond(serenity_ctx, command, &format_confirmation(&event, Utc::now())).await
            }
            Err(StoreError::DuplicateKey { name, .. }) => {
                respond(
                    serenity_ctx,
                    command,
                    &format!("❌ You already have an event called **{name}**. Remove it first or pick another name."),
                )
                .await
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Handle /remove_event - delete one of the caller's events
    async fn handle_remove_event(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let owner_id = command.user.id.0;
        let name = get_string_option(&command.data.options, "name")
            .map(|n| n.trim().to_string())
            .ok_or_else(|| anyhow::anyhow!("Missing name parameter"))?;

        let content = if ctx.database.delete(&name, owner_id).await? {
            info!("Deleted event '{name}' for user {owner_id}");
            format!("✅ Removed event **{name}**.")
        } else {
            format!("❌ No event called **{name}** found. Use `/events` to see yours.")
        };

        respond(serenity_ctx, command, &content).await
    }

    /// Handle /events - list the caller's events
    async fn handle_events(
        &self,
        ctx: &CommandContext,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let owner_id = command.user.id.0;
        let mut events = Vec::new();
        for record in ctx.database.list_by_owner(owner_id).await? {
            match CalendarEvent::try_from(record) {
                Ok(event) => events.push(event),
                Err(e) => warn!("Hiding {e} from /events"),
            }
        }

        let listing = format_event_list(&events, Utc::now());
        let mut chunks = chunk_for_message(&listing).into_iter();

        if let Some(first) = chunks.next() {
            respond(serenity_ctx, command, &first).await?;
        }
        for chunk in chunks {
            command
                .create_followup_message(&serenity_ctx.http, |message| message.content(chunk))
                .await?;
        }

        Ok(())
    }
}
