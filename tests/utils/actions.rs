#![allow(dead_code)] // Test utilities may not all be used in every test

use serde_json::{json, Value};

use liveboard::websockets::MessageHandler;

use super::setup::TestSetup;

// ============================================================================
// Action Helpers
// ============================================================================

impl TestSetup {
    /// Deliver a raw text frame as if it came from `connection_id`
    pub async fn send_raw(&self, connection_id: &str, frame: &str) {
        self.input_handler
            .handle_message(connection_id, frame.to_string())
            .await;
    }

    /// Send a `{type, payload}` frame
    pub async fn send_message(&self, connection_id: &str, message_type: &str, payload: Value) {
        let frame = json!({ "type": message_type, "payload": payload }).to_string();
        self.send_raw(connection_id, &frame).await;
    }

    /// Clear all recorded messages
    pub async fn clear_messages(&self) {
        self.mock_conn_manager.clear_messages().await;
    }

    /// Simulate the transport noticing a dropped socket
    pub async fn disconnect(&self, connection_id: &str) {
        self.event_bus.disconnect(connection_id).await;
    }

    // ============================================================================
    // Convenience Action Methods
    // ============================================================================

    pub async fn join(&self, connection_id: &str, username: &str) {
        self.send_message(
            connection_id,
            "join",
            json!({ "session_id": self.session_id, "username": username }),
        )
        .await;
    }

    pub async fn leave(&self, connection_id: &str, username: &str) {
        self.send_message(
            connection_id,
            "leave",
            json!({ "session_id": self.session_id, "username": username }),
        )
        .await;
    }

    pub async fn send_stroke(&self, connection_id: &str, stroke: Value) {
        self.send_message(
            connection_id,
            "stroke",
            json!({ "session_id": self.session_id, "stroke": stroke }),
        )
        .await;
    }

    pub async fn send_chat(&self, connection_id: &str, username: &str, message: &str) {
        self.send_message(
            connection_id,
            "chat",
            json!({ "session_id": self.session_id, "username": username, "message": message }),
        )
        .await;
    }

    pub async fn send_clear(&self, connection_id: &str, username: &str) {
        self.send_message(
            connection_id,
            "clear",
            json!({ "session_id": self.session_id, "username": username }),
        )
        .await;
    }

    pub async fn send_undo(&self, connection_id: &str, username: &str) {
        self.send_message(
            connection_id,
            "undo",
            json!({ "session_id": self.session_id, "username": username }),
        )
        .await;
    }
}
