// Durable, append-only event log
//
// The log is the single source of truth for a session's history: every accepted
// drawing/chat event lands here before anyone else hears about it.

// Public API - what other modules can use
pub use errors::StoreError;
pub use models::{now_seconds, EventType, Payload, StoredEvent};
pub use repository::{EventStore, InMemoryEventStore};
pub use sqlite::SqliteEventStore;

// Internal modules
mod errors;
mod models;
mod repository;
mod sqlite;
