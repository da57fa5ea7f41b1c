//! Shared context for command handlers
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use crate::database::Database;

/// Shared context for all command handlers
///
/// Holds the database handle created at startup and the bot start time for
/// uptime reporting.
#[derive(Clone)]
pub struct CommandContext {
    pub database: Database,
    pub start_time: std::time::Instant,
}

impl CommandContext {
    pub fn new(database: Database) -> Self {
        Self {
            database,
            start_time: std::time::Instant::now(),
        }
    }
}
