#![allow(dead_code)] // Test utilities may not all be used in every test

use std::sync::Arc;

use liveboard::{
    event::EventBus,
    replay::ReplayBuilder,
    room::InMemorySessionRegistry,
    store::{EventStore, InMemoryEventStore},
    websockets::WebsocketReceiveHandler,
};

use super::mocks::MockConnectionManager;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub event_bus: EventBus,
    pub event_store: Arc<dyn EventStore>,
    pub registry: Arc<InMemorySessionRegistry>,
    pub mock_conn_manager: Arc<MockConnectionManager>,
    pub input_handler: WebsocketReceiveHandler,
    pub replay_builder: ReplayBuilder,
    pub session_id: String,
    /// (connection_id, username) of every connection joined by the builder
    pub members: Vec<(String, String)>,
}

pub struct TestSetupBuilder {
    members: Vec<(String, String)>,
    session_id: String,
    event_store: Option<Arc<dyn EventStore>>,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            members: vec![],
            session_id: "room1".to_string(),
            event_store: None,
        }
    }

    pub fn with_session(mut self, session_id: &str) -> Self {
        self.session_id = session_id.to_string();
        self
    }

    /// Connections joined to the session before the test starts, as (connection_id, username)
    pub fn with_members(mut self, members: Vec<(&str, &str)>) -> Self {
        self.members = members
            .into_iter()
            .map(|(c, u)| (c.to_string(), u.to_string()))
            .collect();
        self
    }

    pub fn with_two_members(self) -> Self {
        self.with_members(vec![("conn-a", "alice"), ("conn-b", "bob")])
    }

    pub fn with_event_store(mut self, store: Arc<dyn EventStore>) -> Self {
        self.event_store = Some(store);
        self
    }

    pub async fn build(self) -> TestSetup {
        let event_store = self
            .event_store
            .unwrap_or_else(|| Arc::new(InMemoryEventStore::new()));
        let registry = Arc::new(InMemorySessionRegistry::new());
        let mock_conn_manager = Arc::new(MockConnectionManager::new());

        let event_bus = EventBus::new(
            event_store.clone(),
            registry.clone(),
            mock_conn_manager.clone(),
        );
        let input_handler = WebsocketReceiveHandler::new(event_bus.clone());
        let replay_builder = ReplayBuilder::new(event_store.clone());

        let setup = TestSetup {
            event_bus,
            event_store,
            registry,
            mock_conn_manager,
            input_handler,
            replay_builder,
            session_id: self.session_id,
            members: self.members,
        };

        // Join through the wire path, then forget the join chatter
        for (connection_id, username) in setup.members.clone() {
            setup.join(&connection_id, &username).await;
        }
        setup.clear_messages().await;

        setup
    }
}
