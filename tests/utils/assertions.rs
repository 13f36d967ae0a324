//! Test assertion helpers - fluent API for verifying test expectations
#![allow(dead_code)] // Test utilities may not all be used in every test

use serde_json::Value;

use liveboard::websockets::{MessageType, WebSocketMessage};

use super::setup::TestSetup;

// ============================================================================
// Assertion Helpers
// ============================================================================

pub struct MessageAssertion<'a> {
    setup: &'a TestSetup,
    connections: Vec<&'a str>,
}

impl<'a> MessageAssertion<'a> {
    /// Create an assertion for every member the setup joined
    pub fn for_all_members(setup: &'a TestSetup) -> Self {
        let connections = setup.members.iter().map(|m| m.0.as_str()).collect();
        Self { setup, connections }
    }

    /// Create an assertion for specific connections
    pub fn for_connections(setup: &'a TestSetup, connections: Vec<&'a str>) -> Self {
        Self { setup, connections }
    }

    /// Assert that connections received a specific message type (consumes the message from queue)
    pub async fn received_message_type(self, expected_type: MessageType) -> MessageContent {
        let mut messages = vec![];

        for connection in &self.connections {
            let message = self
                .setup
                .mock_conn_manager
                .consume_message_for(connection)
                .await;
            assert!(
                message.is_some(),
                "{} should have received a message",
                connection
            );

            let msg: WebSocketMessage = serde_json::from_str(&message.unwrap()).unwrap();
            assert_eq!(
                msg.message_type, expected_type,
                "{} received wrong message type",
                connection
            );
            messages.push(msg);
        }

        // Everyone in a fan-out gets the same payload
        if messages.len() > 1 {
            let first_payload = &messages[0].payload;
            for (i, msg) in messages.iter().enumerate().skip(1) {
                assert_eq!(
                    &msg.payload, first_payload,
                    "{} payload differs from {}",
                    self.connections[i], self.connections[0]
                );
            }
        }

        MessageContent {
            payload: messages[0].payload.clone(),
        }
    }

    /// Assert that connections received no messages
    pub async fn received_no_messages(self) {
        for connection in &self.connections {
            let messages = self
                .setup
                .mock_conn_manager
                .get_messages_for(connection)
                .await;
            assert!(
                messages.is_empty(),
                "{} should not have received any messages, got {:?}",
                connection,
                messages
            );
        }
    }

    /// Assert that connections received a sequence of message types in order (non-consuming)
    pub async fn received_message_sequence(self, expected_types: Vec<MessageType>) {
        for connection in &self.connections {
            let messages = self
                .setup
                .mock_conn_manager
                .get_messages_for(connection)
                .await;
            let actual: Vec<MessageType> = messages
                .iter()
                .map(|m| {
                    serde_json::from_str::<WebSocketMessage>(m)
                        .unwrap_or_else(|e| panic!("Failed to parse message for {}: {}", connection, e))
                        .message_type
                })
                .collect();
            assert_eq!(
                actual, expected_types,
                "{} received an unexpected sequence",
                connection
            );
        }
    }
}

// ============================================================================
// Message Content Assertions
// ============================================================================

pub struct MessageContent {
    payload: Value,
}

impl MessageContent {
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Assert the message names a specific user
    pub fn with_username(self, expected: &str) -> Self {
        assert_eq!(self.payload["username"], expected);
        self
    }

    /// Assert the message carries a specific chat message
    pub fn with_message(self, expected: &str) -> Self {
        assert_eq!(self.payload["message"], expected);
        self
    }

    /// Assert the message credits a specific actor (clear, undo)
    pub fn by(self, expected: &str) -> Self {
        assert_eq!(self.payload["by"], expected);
        self
    }

    /// Assert the message carries exactly this stroke
    pub fn with_stroke(self, expected: &Value) -> Self {
        assert_eq!(&self.payload["stroke"], expected);
        self
    }
}
