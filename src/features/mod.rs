//! # Features
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

pub mod calendar;

pub use calendar::{CalendarScheduler, ReconciliationEngine};

/// Bot version from Cargo.toml
pub fn get_bot_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
