use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use super::errors::BusError;
use crate::websockets::{MessageType, WebSocketMessage};

/// Payload shared by join, leave, clear and undo
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorPayload {
    pub session_id: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrokePayload {
    pub session_id: Option<String>,
    /// Opaque drawing data; absent or empty strokes are dropped by the bus
    pub stroke: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatPayload {
    pub session_id: Option<String>,
    pub username: Option<String>,
    pub message: Option<String>,
    // Any client-sent timestamp is ignored; chat order is server time
}

/// Events a client may send, validated at the transport boundary
///
/// Anything that does not decode into one of these variants never reaches the bus.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Join(ActorPayload),
    Leave(ActorPayload),
    Stroke(StrokePayload),
    Clear(ActorPayload),
    Chat(ChatPayload),
    Undo(ActorPayload),
}

impl InboundEvent {
    /// Parse a raw text frame into an inbound event
    pub fn parse(raw: &str) -> Result<Self, BusError> {
        let message: WebSocketMessage = serde_json::from_str(raw)
            .map_err(|e| BusError::validation(format!("invalid message: {}", e)))?;
        Self::try_from(message)
    }

    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            InboundEvent::Join(_) => "join",
            InboundEvent::Leave(_) => "leave",
            InboundEvent::Stroke(_) => "stroke",
            InboundEvent::Clear(_) => "clear",
            InboundEvent::Chat(_) => "chat",
            InboundEvent::Undo(_) => "undo",
        }
    }

    /// Session the client asked for, before defaulting
    pub fn requested_session(&self) -> Option<&str> {
        match self {
            InboundEvent::Join(p)
            | InboundEvent::Leave(p)
            | InboundEvent::Clear(p)
            | InboundEvent::Undo(p) => p.session_id.as_deref(),
            InboundEvent::Stroke(p) => p.session_id.as_deref(),
            InboundEvent::Chat(p) => p.session_id.as_deref(),
        }
    }
}

impl TryFrom<WebSocketMessage> for InboundEvent {
    type Error = BusError;

    fn try_from(message: WebSocketMessage) -> Result<Self, Self::Error> {
        let payload = message.payload;
        match message.message_type {
            MessageType::Join => Ok(InboundEvent::Join(decode(payload)?)),
            MessageType::Leave => Ok(InboundEvent::Leave(decode(payload)?)),
            MessageType::Stroke => Ok(InboundEvent::Stroke(decode(payload)?)),
            MessageType::Clear => Ok(InboundEvent::Clear(decode(payload)?)),
            MessageType::Chat => Ok(InboundEvent::Chat(decode(payload)?)),
            MessageType::Undo => Ok(InboundEvent::Undo(decode(payload)?)),
            other => Err(BusError::validation(format!(
                "unsupported event type: {:?}",
                other
            ))),
        }
    }
}

fn decode<T: DeserializeOwned + Default>(payload: Value) -> Result<T, BusError> {
    if payload.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(payload)
        .map_err(|e| BusError::validation(format!("invalid payload: {}", e)))
}
