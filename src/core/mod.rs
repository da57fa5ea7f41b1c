//! # Core Module
//!
//! Configuration and shared helpers for the calendar bot.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Add time module with duration and event time parsing
//! - 1.1.0: Add response module with Discord message chunking utilities
//! - 1.0.0: Initial creation with config module

pub mod config;
pub mod response;
pub mod time;

// Re-export commonly used items
pub use config::Config;
pub use response::{chunk_for_message, chunk_text, truncate_chars, MESSAGE_LIMIT};
pub use time::{format_duration, parse_duration, parse_event_time};
