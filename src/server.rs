use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::replay::{index, replay_session};
use crate::shared::AppState;
use crate::websockets::websocket_handler;

/// All HTTP and WebSocket routes of the relay
pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/replay/:session_id", get(replay_session))
        .route("/ws", get(websocket_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
