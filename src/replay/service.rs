use std::sync::Arc;
use tracing::{debug, instrument};

use super::types::ReplayResponse;
use crate::store::{EventStore, StoreError};

/// Rebuilds a session's history from the event log
///
/// Pure read: never mutates the log or membership.
#[derive(Clone)]
pub struct ReplayBuilder {
    store: Arc<dyn EventStore>,
}

impl ReplayBuilder {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// All events of the session in the order they were accepted.
    /// Either the complete history or an error, never a truncated list.
    #[instrument(skip(self))]
    pub async fn replay(&self, session_id: &str) -> Result<ReplayResponse, StoreError> {
        let events = self.store.read_ordered(session_id).await?;
        debug!(session_id = %session_id, count = events.len(), "Replay built");

        Ok(ReplayResponse {
            session_id: session_id.to_string(),
            events: events.into_iter().map(Into::into).collect(),
        })
    }
}
