//! # Utility Commands
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use serenity::builder::CreateApplicationCommand;

pub fn create_commands() -> Vec<CreateApplicationCommand> {
    [
        ("ping", "Test bot responsiveness"),
        ("help", "Show available commands"),
        ("status", "Show uptime and version"),
    ]
    .into_iter()
    .map(|(name, description)| {
        let mut command = CreateApplicationCommand::default();
        command.name(name).description(description);
        command
    })
    .collect()
}
