use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::{
    errors::StoreError,
    models::{now_seconds, EventType, Payload, StoredEvent},
};

/// Trait for event log operations
///
/// Implementations must serialize appends so that `(timestamp, id)` order is
/// total and equals the order in which `append` calls returned.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Assigns id and timestamp, persists the event and returns it.
    /// Once this returns `Ok` the event must survive a restart.
    async fn append(
        &self,
        session_id: &str,
        event_type: EventType,
        payload: Payload,
    ) -> Result<StoredEvent, StoreError>;

    /// All events of a session in ascending `(timestamp, id)` order.
    /// A session without events yields an empty list.
    async fn read_ordered(&self, session_id: &str) -> Result<Vec<StoredEvent>, StoreError>;
}

#[derive(Debug, Default)]
struct InMemoryLog {
    events: Vec<StoredEvent>,
    last_timestamp: f64,
}

/// In-memory implementation of EventStore for development and testing
///
/// Data lives only as long as the process.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    log: RwLock<InMemoryLog>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of events across all sessions
    pub async fn len(&self) -> usize {
        self.log.read().await.events.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    #[instrument(skip(self, payload))]
    async fn append(
        &self,
        session_id: &str,
        event_type: EventType,
        payload: Payload,
    ) -> Result<StoredEvent, StoreError> {
        let mut log = self.log.write().await;

        // Clock steps backwards must not reorder the log
        let timestamp = now_seconds().max(log.last_timestamp);
        log.last_timestamp = timestamp;

        let event = StoredEvent {
            id: log.events.len() as i64 + 1,
            session_id: session_id.to_string(),
            timestamp,
            event_type,
            payload,
        };
        log.events.push(event.clone());

        debug!(
            session_id = %session_id,
            event_id = event.id,
            event_type = %event_type,
            "Event appended in memory"
        );
        Ok(event)
    }

    #[instrument(skip(self))]
    async fn read_ordered(&self, session_id: &str) -> Result<Vec<StoredEvent>, StoreError> {
        let log = self.log.read().await;
        let events: Vec<StoredEvent> = log
            .events
            .iter()
            .filter(|e| e.session_id == session_id)
            .cloned()
            .collect();

        debug!(session_id = %session_id, count = events.len(), "Events read from memory");
        Ok(events)
    }
}
