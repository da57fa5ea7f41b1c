//! Event persistence port
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::event::{CalendarEvent, EventRecord, OwnerId};

/// Errors surfaced by an [`EventStore`]
#[derive(Debug, Error)]
pub enum StoreError {
    /// An event with the same `(name, owner_id)` already exists
    #[error("event '{name}' already exists for owner {owner_id}")]
    DuplicateKey { name: String, owner_id: OwnerId },

    /// The backing store could not be reached or failed mid-operation
    #[error("event store unavailable: {0}")]
    Unavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Persistence capability the calendar depends on
///
/// Events are keyed by `(name, owner_id)`. Every mutation is atomic for the
/// row it touches. Listings hand back raw [`EventRecord`]s so a single bad row
/// can be skipped by the caller instead of failing the whole listing.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Insert a new event, failing with [`StoreError::DuplicateKey`] on collision
    async fn insert(&self, event: &CalendarEvent) -> Result<(), StoreError>;

    /// Delete an event; returns whether a row was removed
    async fn delete(&self, name: &str, owner_id: OwnerId) -> Result<bool, StoreError>;

    /// All events of one owner, earliest first
    async fn list_by_owner(&self, owner_id: OwnerId) -> Result<Vec<EventRecord>, StoreError>;

    /// Every stored event, in no particular order
    async fn list_all(&self) -> Result<Vec<EventRecord>, StoreError>;

    async fn update_reminded(
        &self,
        name: &str,
        owner_id: OwnerId,
        reminded: bool,
    ) -> Result<(), StoreError>;

    /// Move an event to its next occurrence and clear its reminder flag
    async fn advance_occurrence(
        &self,
        name: &str,
        owner_id: OwnerId,
        next_at: DateTime<Utc>,
        repeat_count: u32,
    ) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_object_safe(_: &dyn EventStore) {}

    #[test]
    fn test_duplicate_key_message() {
        let err = StoreError::DuplicateKey {
            name: "standup".to_string(),
            owner_id: 42,
        };
        assert_eq!(err.to_string(), "event 'standup' already exists for owner 42");
    }
}
