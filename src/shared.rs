use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::event::EventBus;
use crate::replay::ReplayBuilder;
use crate::room::SessionRegistry;
use crate::store::{EventStore, StoreError};
use crate::websockets::ConnectionManager;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub event_store: Arc<dyn EventStore>,
    pub connection_manager: Arc<dyn ConnectionManager>,
    pub event_bus: EventBus,
    pub replay_builder: ReplayBuilder,
}

impl AppState {
    pub fn new(
        event_store: Arc<dyn EventStore>,
        session_registry: Arc<dyn SessionRegistry>,
        connection_manager: Arc<dyn ConnectionManager>,
        default_session: &str,
    ) -> Self {
        let event_bus = EventBus::new(
            Arc::clone(&event_store),
            session_registry,
            Arc::clone(&connection_manager),
        )
        .with_default_session(default_session);
        let replay_builder = ReplayBuilder::new(Arc::clone(&event_store));

        Self {
            event_store,
            connection_manager,
            event_bus,
            replay_builder,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Storage(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Storage(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Storage error: {}", msg),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
