use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur while handling a single inbound event
///
/// Every variant is scoped to the event it arose from; none of them affect other
/// sessions or other in-flight events.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Delivery error: {0}")]
    Delivery(String),
}

impl BusError {
    pub fn validation(msg: impl Into<String>) -> Self {
        BusError::Validation(msg.into())
    }

    /// Message safe to show to the client that caused the error
    pub fn client_message(&self) -> String {
        match self {
            BusError::Validation(msg) => msg.clone(),
            BusError::Storage(_) => "event could not be stored".to_string(),
            BusError::Delivery(_) => "event could not be delivered".to_string(),
        }
    }
}
