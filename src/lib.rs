// Core layer - shared types and configuration
pub mod core;

// Features layer - calendar events, reminders and the sweep
pub mod features;

// Infrastructure
pub mod database;

// Application layer
pub mod command_handler;
pub mod commands;

// Re-export core config
pub use core::Config;

pub use features::calendar::{
    CalendarEvent, CalendarScheduler, Clock, DiscordNotifier, EventStore, Notifier,
    ReconciliationEngine, SweepReport, SystemClock,
};
