//! # SQLite Database
//!
//! Single shared connection behind an async mutex. The handle is cheap to clone
//! and is created once at startup, then passed to whatever needs storage.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: `(name, owner_id)` primary key, typed `EventRecord` rows
//! - 1.0.0: Initial events table

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{info, warn};
use rusqlite::{params, Connection, ErrorCode, Row};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::features::calendar::event::{format_timestamp, CalendarEvent, EventRecord, OwnerId};
use crate::features::calendar::store::{EventStore, StoreError};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS events (
        name TEXT NOT NULL,
        scheduled_at TEXT NOT NULL,
        owner_id INTEGER NOT NULL,
        description TEXT,
        reminder_lead_minutes INTEGER DEFAULT 0,
        repeat_interval_seconds INTEGER,
        max_repeats INTEGER,
        repeat_count INTEGER NOT NULL DEFAULT 0,
        reminded BOOLEAN NOT NULL DEFAULT 0,
        PRIMARY KEY (name, owner_id)
    );
    CREATE INDEX IF NOT EXISTS idx_events_owner ON events(owner_id);
";

const EVENT_COLUMNS: &str = "name, scheduled_at, owner_id, description, reminder_lead_minutes, \
     repeat_interval_seconds, max_repeats, repeat_count, reminded";

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database file and make sure the schema exists
    pub async fn new(database_path: &str) -> Result<Self> {
        let conn = Connection::open(database_path)?;
        let database = Self::from_connection(conn)?;
        info!("🗄️ Database ready at {database_path}");
        Ok(database)
    }

    /// Fresh database that lives only as long as the handle
    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Database {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn read_record(row: &Row<'_>) -> rusqlite::Result<EventRecord> {
        Ok(EventRecord {
            name: row.get("name")?,
            scheduled_at: row.get("scheduled_at")?,
            owner_id: row.get("owner_id")?,
            description: row.get("description")?,
            reminder_lead_minutes: row.get("reminder_lead_minutes")?,
            repeat_interval_seconds: row.get("repeat_interval_seconds")?,
            max_repeats: row.get("max_repeats")?,
            repeat_count: row.get("repeat_count")?,
            reminded: row.get("reminded")?,
        })
    }

    /// Run a SELECT over events, dropping rows whose columns have the wrong type
    fn query_records(
        conn: &Connection,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> rusqlite::Result<Vec<EventRecord>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, Self::read_record)?;

        let mut records = Vec::new();
        for row in rows {
            match row {
                Ok(record) => records.push(record),
                Err(e @ rusqlite::Error::FromSqlConversionFailure(..))
                | Err(e @ rusqlite::Error::InvalidColumnType(..))
                | Err(e @ rusqlite::Error::IntegralValueOutOfRange(..)) => {
                    warn!("Skipping unreadable event row: {e}");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(records)
    }
}

fn unavailable(e: rusqlite::Error) -> StoreError {
    StoreError::Unavailable(Box::new(e))
}

#[async_trait]
impl EventStore for Database {
    async fn insert(&self, event: &CalendarEvent) -> Result<(), StoreError> {
        let record = EventRecord::from(event);
        let conn = self.conn.lock().await;

        let result = conn.execute(
            &format!("INSERT INTO events ({EVENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
            params![
                record.name,
                record.scheduled_at,
                record.owner_id,
                record.description,
                record.reminder_lead_minutes,
                record.repeat_interval_seconds,
                record.max_repeats,
                record.repeat_count,
                record.reminded,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if e.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) => {
                Err(StoreError::DuplicateKey {
                    name: event.name.clone(),
                    owner_id: event.owner_id,
                })
            }
            Err(e) => Err(unavailable(e)),
        }
    }

    async fn delete(&self, name: &str, owner_id: OwnerId) -> Result<bool, StoreError> {
        let conn = self.conn.lock().await;
        let removed = conn
            .execute(
                "DELETE FROM events WHERE name = ?1 AND owner_id = ?2",
                params![name, owner_id as i64],
            )
            .map_err(unavailable)?;
        Ok(removed > 0)
    }

    async fn list_by_owner(&self, owner_id: OwnerId) -> Result<Vec<EventRecord>, StoreError> {
        let conn = self.conn.lock().await;
        Self::query_records(
            &conn,
            &format!(
                "SELECT {EVENT_COLUMNS} FROM events WHERE owner_id = ?1 ORDER BY scheduled_at, name"
            ),
            params![owner_id as i64],
        )
        .map_err(unavailable)
    }

    async fn list_all(&self) -> Result<Vec<EventRecord>, StoreError> {
        let conn = self.conn.lock().await;
        Self::query_records(&conn, &format!("SELECT {EVENT_COLUMNS} FROM events"), [])
            .map_err(unavailable)
    }

    async fn update_reminded(
        &self,
        name: &str,
        owner_id: OwnerId,
        reminded: bool,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "UPDATE events SET reminded = ?1 WHERE name = ?2 AND owner_id = ?3",
            params![reminded, name, owner_id as i64],
        )
        .map_err(unavailable)?;
        Ok(())
    }

    async fn advance_occurrence(
        &self,
        name: &str,
        owner_id: OwnerId,
        next_at: DateTime<Utc>,
        repeat_count: u32,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "UPDATE events SET scheduled_at = ?1, repeat_count = ?2, reminded = 0 \
             WHERE name = ?3 AND owner_id = ?4",
            params![format_timestamp(next_at), repeat_count, name, owner_id as i64],
        )
        .map_err(unavailable)?;
        Ok(())
    }
}
