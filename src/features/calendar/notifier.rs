//! Reminder delivery
//!
//! Reminders are sent as direct messages. Delivery is best-effort: the sweep
//! records the reminder as sent whatever the outcome.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Report `DeliveryOutcome` instead of swallowing errors
//! - 1.0.0: Initial DM delivery

use async_trait::async_trait;
use log::{debug, info};
use serenity::http::{Http, StatusCode};
use serenity::model::id::UserId;
use std::sync::Arc;

use super::event::OwnerId;

/// Result of a single delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// The recipient does not exist or cannot be reached
    NotFound,
    Failed(String),
}

/// Capability for delivering a message to an event owner
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, owner_id: OwnerId, text: &str) -> DeliveryOutcome;
}

/// Sends reminders as Discord direct messages
#[derive(Clone)]
pub struct DiscordNotifier {
    http: Arc<Http>,
}

impl DiscordNotifier {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    async fn deliver(&self, owner_id: OwnerId, text: &str) -> serenity::Result<()> {
        let user = UserId(owner_id).to_user(&self.http).await?;
        let dm = user.create_dm_channel(&self.http).await?;
        dm.say(&self.http, text).await?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn send(&self, owner_id: OwnerId, text: &str) -> DeliveryOutcome {
        match self.deliver(owner_id, text).await {
            Ok(()) => {
                info!("📬 Delivered reminder DM to user {owner_id}");
                DeliveryOutcome::Delivered
            }
            Err(e) => {
                let outcome = classify_error(&e);
                debug!("DM to user {owner_id} not delivered ({outcome:?}): {e}");
                outcome
            }
        }
    }
}

/// Map a serenity error onto a delivery outcome
fn classify_error(error: &serenity::Error) -> DeliveryOutcome {
    if let serenity::Error::Http(http_error) = error {
        // 403 means DMs are closed for this user
        if matches!(
            http_error.status_code(),
            Some(StatusCode::NOT_FOUND) | Some(StatusCode::FORBIDDEN)
        ) {
            return DeliveryOutcome::NotFound;
        }
    }
    DeliveryOutcome::Failed(error.to_string())
}
