//! Slash command handler trait
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use anyhow::Result;
use async_trait::async_trait;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::prelude::Context;
use std::sync::Arc;

use super::context::CommandContext;

/// A group of slash commands served together
///
/// `CalendarHandler` answers `/add_event`, `/remove_event` and `/events`;
/// `UtilityHandler` answers `/ping`, `/help` and `/status`. The registry maps
/// each name from `command_names` back to its handler.
#[async_trait]
pub trait SlashCommandHandler: Send + Sync {
    /// Command name(s) this handler processes
    fn command_names(&self) -> &'static [&'static str];

    /// Answer one invocation. Errors are turned into a generic reply by
    /// `CommandHandler`, so user-facing validation messages go out as `Ok`.
    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        serenity_ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()>;
}
