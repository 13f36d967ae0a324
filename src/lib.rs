// Library crate for the LiveBoard relay
// This file exposes the public API for integration tests

pub mod config;
pub mod event;
pub mod replay;
pub mod room;
pub mod server;
pub mod shared;
pub mod store;
pub mod websockets;

// Re-export commonly used types for easier access in tests
pub use config::Config;
pub use event::{BusError, EventBus, InboundEvent};
pub use replay::{ReplayBuilder, ReplayResponse};
pub use room::{InMemorySessionRegistry, Member, SessionRegistry};
pub use shared::{AppError, AppState};
pub use store::{EventStore, EventType, InMemoryEventStore, SqliteEventStore, StoredEvent};
pub use websockets::{
    ConnectionManager, InMemoryConnectionManager, MessageHandler, MessageType, WebSocketMessage,
    WebsocketReceiveHandler,
};
