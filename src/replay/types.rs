use serde::{Deserialize, Serialize};

use crate::store::{EventType, Payload, StoredEvent};

/// One entry of a replayed session, in the public `{ts, event, payload}` shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayEvent {
    #[serde(rename = "ts")]
    pub timestamp: f64,
    #[serde(rename = "event")]
    pub event_type: EventType,
    pub payload: Payload,
}

impl From<StoredEvent> for ReplayEvent {
    fn from(event: StoredEvent) -> Self {
        Self {
            timestamp: event.timestamp,
            event_type: event.event_type,
            payload: event.payload,
        }
    }
}

/// Response for GET /api/replay/{session_id}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayResponse {
    pub session_id: String,
    pub events: Vec<ReplayEvent>,
}

/// Query parameters of the landing page
#[derive(Debug, Default, Deserialize)]
pub struct LandingQuery {
    pub session: Option<String>,
}
