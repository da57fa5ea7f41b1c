//! Periodic driver for the reconciliation sweep
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Injected `Clock`, skip missed ticks instead of bursting
//! - 1.0.0: Initial 60 second sweep loop

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use super::engine::{ReconciliationEngine, SweepError, SweepReport};

/// Default time between sweeps
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Source of the current time for a sweep
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock in UTC
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Runs one sweep per tick on a fixed period
pub struct CalendarScheduler {
    engine: Arc<ReconciliationEngine>,
    clock: Arc<dyn Clock>,
    period: Duration,
}

impl CalendarScheduler {
    pub fn new(engine: Arc<ReconciliationEngine>, clock: Arc<dyn Clock>, period: Duration) -> Self {
        Self {
            engine,
            clock,
            period,
        }
    }

    /// Sweep forever
    ///
    /// Each sweep is awaited before the next tick is taken, and ticks missed
    /// while a slow sweep was running are dropped rather than replayed.
    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "📅 Calendar scheduler started (interval: {}s)",
            self.period.as_secs()
        );

        loop {
            interval.tick().await;
            self.tick().await;
        }
    }

    /// Run a single sweep at the clock's current time and log the outcome
    pub async fn tick(&self) -> Option<SweepReport> {
        let now = self.clock.now();
        match self.engine.run_once(now).await {
            Ok(report) => {
                if report.has_activity() {
                    info!("📅 Calendar sweep finished: {report}");
                } else {
                    debug!("Calendar sweep finished: {report}");
                }
                Some(report)
            }
            Err(SweepError::InProgress) => {
                debug!("Calendar sweep still running, skipping tick");
                None
            }
            Err(e) => {
                warn!("Calendar sweep aborted, retrying next tick: {e}");
                None
            }
        }
    }
}
