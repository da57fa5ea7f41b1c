//! # Calendar Commands
//!
//! Definitions for /add_event, /remove_event and /events.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.1.0: `repeat` and `max_repeats` options
//! - 1.0.0: Initial implementation

use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::CommandOptionType;

pub fn create_commands() -> Vec<CreateApplicationCommand> {
    vec![
        create_add_event_command(),
        create_remove_event_command(),
        create_events_command(),
    ]
}

fn create_add_event_command() -> CreateApplicationCommand {
    let mut command = CreateApplicationCommand::default();
    command
        .name("add_event")
        .description("Schedule an event and get a DM reminder before it starts")
        .create_option(|option| {
            option
                .name("name")
                .description("Event name (unique among your events)")
                .kind(CommandOptionType::String)
                .required(true)
        })
        .create_option(|option| {
            option
                .name("when")
                .description("Start time in UTC, e.g. 2024-01-31 09:30")
                .kind(CommandOptionType::String)
                .required(true)
        })
        .create_option(|option| {
            option
                .name("description")
                .description("Shown in the reminder")
                .kind(CommandOptionType::String)
                .required(false)
        })
        .create_option(|option| {
            option
                .name("reminder_minutes")
                .description("How many minutes before the start to remind you (default 0)")
                .kind(CommandOptionType::Integer)
                .min_int_value(0)
                .required(false)
        })
        .create_option(|option| {
            option
                .name("repeat")
                .description("Repeat interval, e.g. 1d, 1w, 12h")
                .kind(CommandOptionType::String)
                .required(false)
        })
        .create_option(|option| {
            option
                .name("max_repeats")
                .description("Stop after this many repeats (default: forever)")
                .kind(CommandOptionType::Integer)
                .min_int_value(1)
                .required(false)
        });
    command
}

fn create_remove_event_command() -> CreateApplicationCommand {
    let mut command = CreateApplicationCommand::default();
    command
        .name("remove_event")
        .description("Delete one of your events")
        .create_option(|option| {
            option
                .name("name")
                .description("Name of the event to delete")
                .kind(CommandOptionType::String)
                .required(true)
        });
    command
}

fn create_events_command() -> CreateApplicationCommand {
    let mut command = CreateApplicationCommand::default();
    command
        .name("events")
        .description("List your scheduled events");
    command
}
