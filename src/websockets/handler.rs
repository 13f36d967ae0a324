use async_trait::async_trait;
use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::event::{EventBus, InboundEvent};
use crate::shared::AppState;

use super::socket::{Connection, MessageHandler};

/// Message handler for receiving WebSocket messages from the client
///
/// Validates each frame into an `InboundEvent` and hands it to the bus. Any
/// rejection is reported back to the originating connection only.
pub struct WebsocketReceiveHandler {
    event_bus: EventBus,
}

impl WebsocketReceiveHandler {
    pub fn new(event_bus: EventBus) -> Self {
        Self { event_bus }
    }
}

#[async_trait]
impl MessageHandler for WebsocketReceiveHandler {
    async fn handle_message(&self, connection_id: &str, message: String) {
        debug!(
            connection_id = %connection_id,
            message = %message,
            "Received message"
        );

        let result = match InboundEvent::parse(&message) {
            Ok(event) => self.event_bus.handle(connection_id, event).await,
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            self.event_bus.report_error(connection_id, &e).await;
        }
    }
}

/// WebSocket endpoint
/// GET /ws - every upgraded socket gets a fresh connection id
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
) -> Response {
    let connection_id = Uuid::new_v4().to_string();
    info!(connection_id = %connection_id, "WebSocket connection requested");

    ws.on_upgrade(move |socket| handle_websocket_connection(socket, connection_id, app_state))
}

/// Handle the upgraded WebSocket connection
async fn handle_websocket_connection(
    socket: axum::extract::ws::WebSocket,
    connection_id: String,
    app_state: AppState,
) {
    info!(connection_id = %connection_id, "WebSocket connection established");

    // Create the outbound channel (app -> client)
    let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel::<String>();

    app_state
        .connection_manager
        .add_connection(connection_id.clone(), outbound_sender)
        .await;

    let message_handler = Arc::new(WebsocketReceiveHandler::new(app_state.event_bus.clone()));

    let connection = Connection::new(
        connection_id.clone(),
        Box::new(socket),
        outbound_receiver,
        message_handler,
    );

    // Run the connection until disconnect
    match connection.run().await {
        Ok(()) => {
            info!(connection_id = %connection_id, "WebSocket connection closed cleanly");
        }
        Err(e) => {
            warn!(
                connection_id = %connection_id,
                error = ?e,
                "WebSocket connection error"
            );
        }
    }

    // Cleanup: stop delivering to the socket, then drop its memberships
    app_state
        .connection_manager
        .remove_connection(&connection_id)
        .await;
    app_state.event_bus.disconnect(&connection_id).await;

    info!(connection_id = %connection_id, "WebSocket connection cleaned up");
}
