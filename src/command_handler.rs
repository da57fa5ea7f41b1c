//! Slash command dispatch
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Dispatch through CommandRegistry instead of a match over every command
//! - 1.0.0: Initial implementation

use crate::commands::{CommandContext, CommandRegistry};
use crate::database::Database;
use anyhow::Result;
use log::{debug, info, warn};
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::prelude::Context;
use std::sync::Arc;
use tokio::time::Instant;
use uuid::Uuid;

const ERROR_REPLY: &str =
    "❌ Sorry, I encountered an error processing your command. Please try again.";

#[derive(Clone)]
pub struct CommandHandler {
    registry: CommandRegistry,
    context: Arc<CommandContext>,
}

impl CommandHandler {
    pub fn new(database: Database) -> Self {
        Self::with_registry(database, CommandRegistry::with_default_handlers())
    }

    pub fn with_registry(database: Database, registry: CommandRegistry) -> Self {
        CommandHandler {
            registry,
            context: Arc::new(CommandContext::new(database)),
        }
    }

    /// Whether a handler is registered for `name`
    pub fn handles(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    pub async fn handle_slash_command(
        &self,
        ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let request_id = Uuid::new_v4();
        let user_id = command.user.id.to_string();
        let guild_id = command
            .guild_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "DM".to_string());

        info!(
            "[{}] 📥 Slash command received | Command: {} | User: {} | Channel: {} | Guild: {}",
            request_id, command.data.name, user_id, command.channel_id, guild_id
        );

        let Some(handler) = self.registry.get(&command.data.name) else {
            warn!("[{}] ❓ Unknown slash command: {}", request_id, command.data.name);
            command
                .create_interaction_response(&ctx.http, |response| {
                    response
                        .kind(InteractionResponseType::ChannelMessageWithSource)
                        .interaction_response_data(|message| {
                            message.content("❓ Unknown command. Try `/help`.")
                        })
                })
                .await?;
            return Ok(());
        };

        let started = Instant::now();
        debug!("[{}] 🎯 Dispatching /{}", request_id, command.data.name);
        handler
            .handle(Arc::clone(&self.context), ctx, command)
            .await
            .map_err(|e| e.context(format!("request {request_id}")))?;

        info!(
            "[{}] ✅ /{} completed in {:?}",
            request_id,
            command.data.name,
            started.elapsed()
        );
        Ok(())
    }

    /// Tell the user their command failed
    ///
    /// Falls back to a followup when the interaction was already answered.
    pub async fn send_error_reply(&self, ctx: &Context, command: &ApplicationCommandInteraction) {
        let initial = command
            .create_interaction_response(&ctx.http, |response| {
                response
                    .kind(InteractionResponseType::ChannelMessageWithSource)
                    .interaction_response_data(|message| message.content(ERROR_REPLY))
            })
            .await;

        if initial.is_err() {
            if let Err(e) = command
                .create_followup_message(&ctx.http, |message| message.content(ERROR_REPLY))
                .await
            {
                warn!("Failed to send error reply for /{}: {e}", command.data.name);
            }
        }
    }
}
