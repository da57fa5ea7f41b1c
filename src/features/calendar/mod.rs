//! # Calendar Feature
//!
//! User-scheduled events with lead-time reminders and recurrence. A periodic
//! sweep reminds owners, advances recurring events and retires spent ones.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Store and notifier behind traits, injected clock
//! - 1.1.0: Recurring events with optional repeat limit
//! - 1.0.0: Initial release with one-off events and reminders

pub mod engine;
pub mod event;
pub mod notifier;
pub mod scheduler;
pub mod store;

pub use engine::{ReconciliationEngine, SweepError, SweepReport};
pub use event::{CalendarEvent, EventRecord, MalformedRecord, OwnerId};
pub use notifier::{DeliveryOutcome, DiscordNotifier, Notifier};
pub use scheduler::{CalendarScheduler, Clock, SystemClock, DEFAULT_SWEEP_INTERVAL};
pub use store::{EventStore, StoreError};
