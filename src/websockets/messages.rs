use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::store::{EventType, StoredEvent};

/// Message types for WebSocket communication
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    // Client -> Server
    Join,
    Leave,

    // Both directions
    Stroke,
    Clear,
    Chat,
    Undo,

    // Server -> Client
    UserJoined,
    UserLeft,
    SessionInfo,
    Error,
}

impl From<EventType> for MessageType {
    fn from(event_type: EventType) -> Self {
        match event_type {
            EventType::Stroke => MessageType::Stroke,
            EventType::Clear => MessageType::Clear,
            EventType::Chat => MessageType::Chat,
            EventType::Undo => MessageType::Undo,
        }
    }
}

/// Metadata for WebSocket messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessageMeta {
    pub timestamp: DateTime<Utc>,
}

/// Envelope for every frame on the wire: `{"type": ..., "payload": {...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessage {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    #[serde(default)]
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<WebSocketMessageMeta>,
}

/// Helper functions for creating server-to-client messages
impl WebSocketMessage {
    pub fn new(message_type: MessageType, payload: Value) -> Self {
        Self {
            message_type,
            payload,
            meta: Some(WebSocketMessageMeta {
                timestamp: Utc::now(),
            }),
        }
    }

    /// Create a STROKE message carrying the stroke exactly as it was persisted
    pub fn stroke(stroke: Value) -> Self {
        Self::new(MessageType::Stroke, json!({ "stroke": stroke }))
    }

    /// Create the live broadcast for a persisted event
    pub fn from_event(event: &StoredEvent) -> Self {
        let payload = Value::Object(event.payload.clone());
        match event.event_type {
            EventType::Stroke => Self::stroke(payload),
            other => Self::new(other.into(), payload),
        }
    }

    /// Create a USER_JOINED message
    pub fn user_joined(username: &str) -> Self {
        Self::new(MessageType::UserJoined, json!({ "username": username }))
    }

    /// Create a USER_LEFT message
    pub fn user_left(username: &str) -> Self {
        Self::new(MessageType::UserLeft, json!({ "username": username }))
    }

    /// Create a SESSION_INFO message
    pub fn session_info(session_id: &str, event_count: usize) -> Self {
        Self::new(
            MessageType::SessionInfo,
            json!({ "session_id": session_id, "event_count": event_count }),
        )
    }

    /// Create an ERROR message
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(MessageType::Error, json!({ "message": message.into() }))
    }
}
