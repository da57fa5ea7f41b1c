//! Reconciliation sweep
//!
//! Each sweep reads every stored event and applies two independent rules
//! against a single `now`:
//!
//! 1. **Reminder** - once `scheduled_at - reminder_lead <= now`, message the owner
//!    and mark the occurrence as reminded, whether or not the message arrived.
//! 2. **Expiration** - once `scheduled_at <= now`, advance a recurring event by one
//!    interval (clearing `reminded`) or delete it when it cannot recur.
//!
//! Both rules see the event as it was read at the start of the sweep, so a
//! freshly advanced occurrence is only considered for a reminder on the next
//! sweep. A late sweep advances each event by a single interval.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Single-flight guard, sweep ids and `SweepReport` counters
//! - 1.1.0: Skip malformed rows instead of aborting the sweep
//! - 1.0.0: Initial reminder and recurrence sweep

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::event::CalendarEvent;
use super::notifier::{DeliveryOutcome, Notifier};
use super::store::{EventStore, StoreError};

/// Why a sweep did not run to completion
#[derive(Debug, Error)]
pub enum SweepError {
    /// Another sweep is still running
    #[error("a sweep is already in progress")]
    InProgress,

    /// Events could not be listed; nothing was processed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Counters for one completed sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Records read from the store
    pub scanned: usize,
    /// Reminders marked as sent
    pub reminded: usize,
    /// Recurring events moved to their next occurrence
    pub advanced: usize,
    /// Events deleted because they expired
    pub retired: usize,
    /// Malformed records left untouched
    pub skipped: usize,
    /// Store writes that failed
    pub failed: usize,
}

impl SweepReport {
    /// True if the sweep changed or attempted to change anything
    pub fn has_activity(&self) -> bool {
        self.reminded + self.advanced + self.retired + self.skipped + self.failed > 0
    }
}

impl std::fmt::Display for SweepReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "scanned={} reminded={} advanced={} retired={} skipped={} failed={}",
            self.scanned, self.reminded, self.advanced, self.retired, self.skipped, self.failed
        )
    }
}

/// Applies reminder and recurrence rules to every stored event
pub struct ReconciliationEngine {
    store: Arc<dyn EventStore>,
    notifier: Arc<dyn Notifier>,
    in_flight: Mutex<()>,
}

impl ReconciliationEngine {
    pub fn new(store: Arc<dyn EventStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            in_flight: Mutex::new(()),
        }
    }

    /// Run one sweep at `now`
    ///
    /// Returns [`SweepError::InProgress`] without touching anything if another
    /// sweep holds the engine, and [`SweepError::Store`] if events could not be
    /// listed. Failures on individual events are logged and counted instead.
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<SweepReport, SweepError> {
        let _guard = self.in_flight.try_lock().map_err(|_| SweepError::InProgress)?;
        let sweep_id = short_id();

        let records = self.store.list_all().await?;
        debug!("[{sweep_id}] 🔎 Sweeping {} events at {now}", records.len());

        let mut report = SweepReport {
            scanned: records.len(),
            ..SweepReport::default()
        };

        for record in records {
            match CalendarEvent::try_from(record) {
                Ok(event) => self.reconcile(&sweep_id, &event, now, &mut report).await,
                Err(e) => {
                    warn!("[{sweep_id}] ⚠️ Skipping {e}");
                    report.skipped += 1;
                }
            }
        }

        Ok(report)
    }

    async fn reconcile(
        &self,
        sweep_id: &str,
        event: &CalendarEvent,
        now: DateTime<Utc>,
        report: &mut SweepReport,
    ) {
        if event.reminder_due(now) {
            self.remind(sweep_id, event).await;
            match self
                .store
                .update_reminded(&event.name, event.owner_id, true)
                .await
            {
                Ok(()) => report.reminded += 1,
                Err(e) => {
                    error!(
                        "[{sweep_id}] ❌ Failed to mark '{}' (owner {}) as reminded: {e}",
                        event.name, event.owner_id
                    );
                    report.failed += 1;
                }
            }
        }

        if !event.has_started(now) {
            return;
        }

        match event.next_occurrence() {
            Some((next_at, repeat_count)) => {
                match self
                    .store
                    .advance_occurrence(&event.name, event.owner_id, next_at, repeat_count)
                    .await
                {
                    Ok(()) => {
                        info!(
                            "[{sweep_id}] 🔁 Advanced '{}' (owner {}) to {next_at} (repeat {repeat_count}{})",
                            event.name,
                            event.owner_id,
                            event
                                .max_repeats
                                .map(|max| format!("/{max}"))
                                .unwrap_or_default()
                        );
                        report.advanced += 1;
                    }
                    Err(e) => {
                        error!(
                            "[{sweep_id}] ❌ Failed to advance '{}' (owner {}): {e}",
                            event.name, event.owner_id
                        );
                        report.failed += 1;
                    }
                }
            }
            None => match self.store.delete(&event.name, event.owner_id).await {
                Ok(_) => {
                    info!(
                        "[{sweep_id}] 🗑️ Retired '{}' (owner {})",
                        event.name, event.owner_id
                    );
                    report.retired += 1;
                }
                Err(e) => {
                    error!(
                        "[{sweep_id}] ❌ Failed to delete expired '{}' (owner {}): {e}",
                        event.name, event.owner_id
                    );
                    report.failed += 1;
                }
            },
        }
    }

    async fn remind(&self, sweep_id: &str, event: &CalendarEvent) {
        let outcome = self
            .notifier
            .send(event.owner_id, &event.reminder_message())
            .await;

        match outcome {
            DeliveryOutcome::Delivered => {
                info!(
                    "[{sweep_id}] 🔔 Reminded user {} about '{}'",
                    event.owner_id, event.name
                );
            }
            DeliveryOutcome::NotFound => {
                warn!(
                    "[{sweep_id}] ⚠️ User {} unreachable, reminder for '{}' dropped",
                    event.owner_id, event.name
                );
            }
            DeliveryOutcome::Failed(reason) => {
                warn!(
                    "[{sweep_id}] ⚠️ Reminder for '{}' (owner {}) failed: {reason}",
                    event.name, event.owner_id
                );
            }
        }
    }
}

fn short_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::calendar::event::{format_timestamp, EventRecord, OwnerId};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct FakeStore {
        rows: StdMutex<HashMap<(String, OwnerId), EventRecord>>,
        extra: StdMutex<Vec<EventRecord>>,
        fail_listing: bool,
        fail_writes: bool,
    }

    impl FakeStore {
        fn with(events: &[CalendarEvent]) -> Self {
            let store = FakeStore::default();
            for event in events {
                store
                    .rows
                    .lock()
                    .unwrap()
                    .insert((event.name.clone(), event.owner_id), EventRecord::from(event));
            }
            store
        }

        fn get(&self, name: &str, owner_id: OwnerId) -> Option<CalendarEvent> {
            self.rows
                .lock()
                .unwrap()
                .get(&(name.to_string(), owner_id))
                .cloned()
                .map(|r| CalendarEvent::try_from(r).unwrap())
        }

        fn unavailable() -> StoreError {
            StoreError::Unavailable("connection lost".into())
        }
    }

    #[async_trait]
    impl EventStore for FakeStore {
        async fn insert(&self, event: &CalendarEvent) -> Result<(), StoreError> {
            let key = (event.name.clone(), event.owner_id);
            let mut rows = self.rows.lock().unwrap();
            if rows.contains_key(&key) {
                return Err(StoreError::DuplicateKey {
                    name: event.name.clone(),
                    owner_id: event.owner_id,
                });
            }
            rows.insert(key, EventRecord::from(event));
            Ok(())
        }

        async fn delete(&self, name: &str, owner_id: OwnerId) -> Result<bool, StoreError> {
            if self.fail_writes {
                return Err(Self::unavailable());
            }
            Ok(self
                .rows
                .lock()
                .unwrap()
                .remove(&(name.to_string(), owner_id))
                .is_some())
        }

        async fn list_by_owner(&self, owner_id: OwnerId) -> Result<Vec<EventRecord>, StoreError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|r| r.owner_id == owner_id as i64)
                .cloned()
                .collect())
        }

        async fn list_all(&self) -> Result<Vec<EventRecord>, StoreError> {
            if self.fail_listing {
                return Err(Self::unavailable());
            }
            let mut all: Vec<EventRecord> = self.rows.lock().unwrap().values().cloned().collect();
            all.extend(self.extra.lock().unwrap().iter().cloned());
            Ok(all)
        }

        async fn update_reminded(
            &self,
            name: &str,
            owner_id: OwnerId,
            reminded: bool,
        ) -> Result<(), StoreError> {
            if self.fail_writes {
                return Err(Self::unavailable());
            }
            if let Some(row) = self.rows.lock().unwrap().get_mut(&(name.to_string(), owner_id)) {
                row.reminded = reminded;
            }
            Ok(())
        }

        async fn advance_occurrence(
            &self,
            name: &str,
            owner_id: OwnerId,
            next_at: DateTime<Utc>,
            repeat_count: u32,
        ) -> Result<(), StoreError> {
            if self.fail_writes {
                return Err(Self::unavailable());
            }
            if let Some(row) = self.rows.lock().unwrap().get_mut(&(name.to_string(), owner_id)) {
                row.scheduled_at = format_timestamp(next_at);
                row.repeat_count = i64::from(repeat_count);
                row.reminded = false;
            }
            Ok(())
        }
    }

    struct RecordingNotifier {
        sent: StdMutex<Vec<(OwnerId, String)>>,
        outcome: DeliveryOutcome,
    }

    impl RecordingNotifier {
        fn returning(outcome: DeliveryOutcome) -> Self {
            Self {
                sent: StdMutex::new(Vec::new()),
                outcome,
            }
        }

        fn count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, owner_id: OwnerId, text: &str) -> DeliveryOutcome {
            self.sent.lock().unwrap().push((owner_id, text.to_string()));
            self.outcome.clone()
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn standup() -> CalendarEvent {
        CalendarEvent::new("standup", 1, at(2024, 1, 1, 9, 0))
            .with_reminder_lead(Duration::minutes(10))
            .with_repeat(Duration::seconds(86400), Some(2))
    }

    fn engine(
        store: FakeStore,
        outcome: DeliveryOutcome,
    ) -> (ReconciliationEngine, Arc<FakeStore>, Arc<RecordingNotifier>) {
        let store = Arc::new(store);
        let notifier = Arc::new(RecordingNotifier::returning(outcome));
        let engine = ReconciliationEngine::new(store.clone(), notifier.clone());
        (engine, store, notifier)
    }

    #[tokio::test]
    async fn test_standup_scenario() {
        let (engine, store, notifier) =
            engine(FakeStore::with(&[standup()]), DeliveryOutcome::Delivered);

        // 08:50: reminder only
        let report = engine.run_once(at(2024, 1, 1, 8, 50)).await.unwrap();
        assert_eq!(report.reminded, 1);
        assert_eq!(report.advanced, 0);
        let event = store.get("standup", 1).unwrap();
        assert!(event.reminded);
        assert_eq!(event.scheduled_at, at(2024, 1, 1, 9, 0));
        assert_eq!(notifier.count(), 1);

        // 09:05: advance, no second reminder this tick
        let report = engine.run_once(at(2024, 1, 1, 9, 5)).await.unwrap();
        assert_eq!(report.advanced, 1);
        assert_eq!(report.reminded, 0);
        let event = store.get("standup", 1).unwrap();
        assert_eq!(event.scheduled_at, at(2024, 1, 2, 9, 0));
        assert_eq!(event.repeat_count, 1);
        assert!(!event.reminded);
        assert_eq!(notifier.count(), 1);

        // Jan 2 09:05: reminder for the new occurrence, then second advance
        let report = engine.run_once(at(2024, 1, 2, 9, 5)).await.unwrap();
        assert_eq!(report.reminded, 1);
        assert_eq!(report.advanced, 1);
        let event = store.get("standup", 1).unwrap();
        assert_eq!(event.scheduled_at, at(2024, 1, 3, 9, 0));
        assert_eq!(event.repeat_count, 2);

        // Jan 3 09:05: max repeats reached, event is retired
        let report = engine.run_once(at(2024, 1, 3, 9, 5)).await.unwrap();
        assert_eq!(report.retired, 1);
        assert!(store.get("standup", 1).is_none());
        assert_eq!(notifier.count(), 3);
    }

    #[tokio::test]
    async fn test_reminder_is_sent_once_per_occurrence() {
        let (engine, store, notifier) =
            engine(FakeStore::with(&[standup()]), DeliveryOutcome::Delivered);

        engine.run_once(at(2024, 1, 1, 8, 50)).await.unwrap();
        engine.run_once(at(2024, 1, 1, 8, 52)).await.unwrap();
        engine.run_once(at(2024, 1, 1, 8, 59)).await.unwrap();

        assert_eq!(notifier.count(), 1);
        assert!(store.get("standup", 1).unwrap().reminded);
    }

    #[tokio::test]
    async fn test_reminder_lead_boundary() {
        for (minute, expected) in [(49, 0), (50, 1), (51, 1)] {
            let (engine, _store, notifier) =
                engine(FakeStore::with(&[standup()]), DeliveryOutcome::Delivered);
            engine.run_once(at(2024, 1, 1, 8, minute)).await.unwrap();
            assert_eq!(notifier.count(), expected, "at 08:{minute}");
        }
    }

    #[tokio::test]
    async fn test_non_recurring_event_is_deleted_on_expiry() {
        let lunch = CalendarEvent::new("lunch", 7, at(2024, 1, 1, 12, 0));
        let (engine, store, notifier) =
            engine(FakeStore::with(&[lunch]), DeliveryOutcome::Delivered);

        let report = engine.run_once(at(2024, 1, 1, 11, 59)).await.unwrap();
        assert_eq!(report, SweepReport { scanned: 1, ..SweepReport::default() });
        assert!(store.get("lunch", 7).is_some());

        // Zero lead: reminder and expiry fire on the same tick
        let report = engine.run_once(at(2024, 1, 1, 12, 0)).await.unwrap();
        assert_eq!(report.reminded, 1);
        assert_eq!(report.retired, 1);
        assert!(store.get("lunch", 7).is_none());
        assert_eq!(notifier.count(), 1);
    }

    #[tokio::test]
    async fn test_repeat_count_never_exceeds_max() {
        let weekly = CalendarEvent::new("review", 3, at(2024, 1, 1, 10, 0))
            .with_repeat(Duration::weeks(1), Some(3));
        let (engine, store, _notifier) =
            engine(FakeStore::with(&[weekly]), DeliveryOutcome::Delivered);

        let mut now = at(2024, 1, 1, 10, 0);
        for expected in 1..=3 {
            engine.run_once(now).await.unwrap();
            let event = store.get("review", 3).unwrap();
            assert_eq!(event.repeat_count, expected);
            assert!(!event.reminded);
            assert!(event.repeat_count <= 3);
            now += Duration::weeks(1);
        }

        let report = engine.run_once(now).await.unwrap();
        assert_eq!(report.retired, 1);
        assert!(store.get("review", 3).is_none());
    }

    #[tokio::test]
    async fn test_late_sweep_advances_one_interval_per_tick() {
        let hourly = CalendarEvent::new("water", 5, at(2024, 1, 1, 8, 0))
            .with_repeat(Duration::hours(1), None);
        let (engine, store, notifier) =
            engine(FakeStore::with(&[hourly]), DeliveryOutcome::Delivered);

        let late = at(2024, 1, 1, 11, 30);
        engine.run_once(late).await.unwrap();
        assert_eq!(store.get("water", 5).unwrap().scheduled_at, at(2024, 1, 1, 9, 0));

        engine.run_once(late).await.unwrap();
        engine.run_once(late).await.unwrap();
        let event = store.get("water", 5).unwrap();
        assert_eq!(event.scheduled_at, at(2024, 1, 1, 11, 0));
        assert_eq!(event.repeat_count, 3);

        engine.run_once(late).await.unwrap();
        let event = store.get("water", 5).unwrap();
        assert_eq!(event.scheduled_at, at(2024, 1, 1, 12, 0));
        assert_eq!(notifier.count(), 4);
    }

    #[tokio::test]
    async fn test_notifier_failure_still_marks_reminded() {
        for outcome in [
            DeliveryOutcome::NotFound,
            DeliveryOutcome::Failed("dm closed".to_string()),
        ] {
            let (engine, store, notifier) = engine(FakeStore::with(&[standup()]), outcome);
            let report = engine.run_once(at(2024, 1, 1, 8, 55)).await.unwrap();
            assert_eq!(report.reminded, 1);
            assert!(store.get("standup", 1).unwrap().reminded);

            engine.run_once(at(2024, 1, 1, 8, 56)).await.unwrap();
            assert_eq!(notifier.count(), 1);
        }
    }

    #[tokio::test]
    async fn test_malformed_record_is_skipped() {
        let store = FakeStore::with(&[CalendarEvent::new("ok", 2, at(2024, 1, 1, 9, 0))]);
        store.extra.lock().unwrap().push(EventRecord {
            name: "broken".to_string(),
            scheduled_at: "not a time".to_string(),
            owner_id: 2,
            description: None,
            reminder_lead_minutes: None,
            repeat_interval_seconds: None,
            max_repeats: None,
            repeat_count: 0,
            reminded: false,
        });
        let (engine, store, _notifier) = engine(store, DeliveryOutcome::Delivered);

        let report = engine.run_once(at(2024, 1, 1, 9, 30)).await.unwrap();
        assert_eq!(report.scanned, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.retired, 1);
        assert!(store.get("ok", 2).is_none());
    }

    #[tokio::test]
    async fn test_out_of_range_lead_is_skipped_without_aborting() {
        let store = FakeStore::with(&[CalendarEvent::new("ok", 2, at(2024, 1, 1, 9, 0))]);
        let mut far_lead = EventRecord::from(&CalendarEvent::new("bad", 2, at(2024, 1, 1, 9, 0)));
        far_lead.reminder_lead_minutes = Some(1_000_000_000_000);
        store.extra.lock().unwrap().push(far_lead);
        let (engine, store, notifier) = engine(store, DeliveryOutcome::Delivered);

        let report = engine.run_once(at(2024, 1, 1, 10, 0)).await.unwrap();
        assert_eq!(report.scanned, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.retired, 1);
        assert!(store.get("ok", 2).is_none());
        assert_eq!(notifier.count(), 1);
    }

    #[tokio::test]
    async fn test_listing_failure_aborts_sweep() {
        let store = FakeStore {
            fail_listing: true,
            ..FakeStore::with(&[standup()])
        };
        let (engine, _store, notifier) = engine(store, DeliveryOutcome::Delivered);

        let result = engine.run_once(at(2024, 1, 1, 9, 5)).await;
        assert!(matches!(result, Err(SweepError::Store(StoreError::Unavailable(_)))));
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn test_write_failures_are_counted_per_event() {
        let store = FakeStore {
            fail_writes: true,
            ..FakeStore::with(&[
                standup(),
                CalendarEvent::new("lunch", 1, at(2024, 1, 1, 12, 0)),
            ])
        };
        let (engine, _store, notifier) = engine(store, DeliveryOutcome::Delivered);

        let report = engine.run_once(at(2024, 1, 1, 12, 0)).await.unwrap();
        assert_eq!(report.scanned, 2);
        // Each event: one failed reminder flag write, one failed advance/delete
        assert_eq!(report.failed, 4);
        assert_eq!(notifier.count(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_sweep_is_rejected() {
        let (engine, _store, _notifier) =
            engine(FakeStore::with(&[standup()]), DeliveryOutcome::Delivered);

        let _held = engine.in_flight.lock().await;
        let result = engine.run_once(at(2024, 1, 1, 8, 50)).await;
        assert!(matches!(result, Err(SweepError::InProgress)));
    }

    #[test]
    fn test_report_activity() {
        assert!(!SweepReport { scanned: 10, ..SweepReport::default() }.has_activity());
        assert!(SweepReport { skipped: 1, ..SweepReport::default() }.has_activity());
        assert_eq!(
            SweepReport { scanned: 2, retired: 1, ..SweepReport::default() }.to_string(),
            "scanned=2 reminded=0 advanced=0 retired=1 skipped=0 failed=0"
        );
    }
}
