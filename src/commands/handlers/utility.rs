//! Utility command handlers
//!
//! Handles: ping, help, status
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use anyhow::Result;
use async_trait::async_trait;
use log::info;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::prelude::Context;
use std::sync::Arc;
use std::time::Duration;

use super::respond;
use crate::commands::context::CommandContext;
use crate::commands::handler::SlashCommandHandler;
use crate::core::format_duration;

const HELP_TEXT: &str = "**Calendar Commands:**
`/add_event <name> <when>` - Schedule an event (`YYYY-MM-DD HH:MM`, UTC)
  Optional: `description`, `reminder_minutes`, `repeat` (e.g. `1d`, `1w`, `12h`), `max_repeats`
`/remove_event <name>` - Delete one of your events
`/events` - List your upcoming events

**Other:**
`/ping` - Test bot responsiveness
`/status` - Uptime and version
`/help` - Show this help message

Reminders arrive by DM, so keep DMs from server members open.";

/// Handler for utility commands: ping, help, status
pub struct UtilityHandler;

#[async_trait]
impl SlashCommandHandler for UtilityHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["ping", "help", "status"]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        match command.data.name.as_str() {
            "ping" => respond(serenity_ctx, command, "Pong!").await?,
            "help" => respond(serenity_ctx, command, HELP_TEXT).await?,
            "status" => {
                let status = status_text(ctx.start_time.elapsed());
                respond(serenity_ctx, command, &status).await?;
            }
            _ => return Ok(()),
        }

        info!(
            "{} command completed for user {}",
            command.data.name, command.user.id
        );
        Ok(())
    }
}

fn status_text(uptime: Duration) -> String {
    format!(
        "**Bot Status**\n\
        ✅ Online and operational\n\
        ⏱️ Uptime: {}\n\
        📦 Version: {}",
        format_duration(uptime.as_secs() as i64),
        crate::features::get_bot_version()
    )
}
