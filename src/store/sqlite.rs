use async_trait::async_trait;
use sqlx::{
    sqlite::{
        SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
        SqliteSynchronous,
    },
    Row,
};
use std::str::FromStr;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::{
    errors::StoreError,
    models::{now_seconds, EventType, Payload, StoredEvent},
    repository::EventStore,
};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS strokes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL,
    ts REAL NOT NULL,
    event_type TEXT NOT NULL,
    payload TEXT NOT NULL
)";

const CREATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS strokes_session_order ON strokes (session_id, ts, id)";

/// SQLite implementation of the event log
///
/// One row per event in the `strokes` table. Appends go through a single async
/// mutex which also remembers the last assigned timestamp.
pub struct SqliteEventStore {
    pool: SqlitePool,
    last_timestamp: Mutex<f64>,
}

impl SqliteEventStore {
    /// Opens (creating if missing) the database at `database_url` and ensures the schema
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Full);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self::from_pool(pool).await?;
        info!(database_url = %database_url, "SQLite event store ready");
        Ok(store)
    }

    /// Wraps an existing pool, creating the schema if needed
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        sqlx::query(CREATE_INDEX).execute(&pool).await?;

        let last_timestamp: Option<f64> = sqlx::query_scalar("SELECT MAX(ts) FROM strokes")
            .fetch_one(&pool)
            .await?;

        Ok(Self {
            pool,
            last_timestamp: Mutex::new(last_timestamp.unwrap_or(0.0)),
        })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn row_to_event(row: &SqliteRow) -> Result<StoredEvent, StoreError> {
        let event_type: String = row.try_get("event_type")?;
        let event_type = EventType::from_str(&event_type)
            .map_err(|_| StoreError::Corrupt(format!("unknown event type '{}'", event_type)))?;

        let raw_payload: String = row.try_get("payload")?;
        let payload = match serde_json::from_str::<serde_json::Value>(&raw_payload)? {
            serde_json::Value::Object(map) => map,
            other => {
                return Err(StoreError::Corrupt(format!(
                    "payload is not an object: {}",
                    other
                )))
            }
        };

        Ok(StoredEvent {
            id: row.try_get("id")?,
            session_id: row.try_get("session_id")?,
            timestamp: row.try_get("ts")?,
            event_type,
            payload,
        })
    }
}

#[async_trait]
impl EventStore for SqliteEventStore {
    #[instrument(skip(self, payload))]
    async fn append(
        &self,
        session_id: &str,
        event_type: EventType,
        payload: Payload,
    ) -> Result<StoredEvent, StoreError> {
        let serialized = serde_json::to_string(&payload)?;

        let mut last_timestamp = self.last_timestamp.lock().await;
        let timestamp = now_seconds().max(*last_timestamp);

        let result = sqlx::query(
            "INSERT INTO strokes (session_id, ts, event_type, payload) VALUES (?, ?, ?, ?)",
        )
        .bind(session_id)
        .bind(timestamp)
        .bind(event_type.as_ref())
        .bind(&serialized)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, session_id = %session_id, "Failed to append event to database");
            StoreError::from(e)
        })?;

        *last_timestamp = timestamp;

        let event = StoredEvent {
            id: result.last_insert_rowid(),
            session_id: session_id.to_string(),
            timestamp,
            event_type,
            payload,
        };

        debug!(
            session_id = %session_id,
            event_id = event.id,
            event_type = %event_type,
            "Event appended to database"
        );
        Ok(event)
    }

    #[instrument(skip(self))]
    async fn read_ordered(&self, session_id: &str) -> Result<Vec<StoredEvent>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, session_id, ts, event_type, payload FROM strokes \
             WHERE session_id = ? ORDER BY ts ASC, id ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, session_id = %session_id, "Failed to read events from database");
            StoreError::from(e)
        })?;

        let events = rows
            .iter()
            .map(Self::row_to_event)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(session_id = %session_id, count = events.len(), "Events read from database");
        Ok(events)
    }
}
