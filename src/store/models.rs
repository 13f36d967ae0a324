use chrono::Utc;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Opaque structured event body; never interpreted beyond pass-through
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// The closed set of event kinds that are persisted to the log
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventType {
    Stroke,
    Clear,
    Chat,
    Undo,
}

/// A single entry of the event log as it was accepted by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    /// Store-assigned, strictly increasing
    pub id: i64,
    pub session_id: String,
    /// Seconds since the Unix epoch, assigned on acceptance
    pub timestamp: f64,
    pub event_type: EventType,
    pub payload: Payload,
}

/// Current wall-clock time as fractional seconds since the Unix epoch
pub fn now_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
