use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::{
    errors::BusError,
    events::{ActorPayload, ChatPayload, InboundEvent, StrokePayload},
};
use crate::{
    room::{Member, SessionRegistry, ANONYMOUS_USERNAME},
    store::{now_seconds, EventStore, EventType, Payload, StoredEvent},
    websockets::{ConnectionManager, WebSocketMessage},
};

/// Session used when a client does not name one
pub const DEFAULT_SESSION: &str = "public";

/// Who receives a broadcast, relative to the connection that caused it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Audience {
    Everyone,
    EveryoneButSender,
}

/// Routes inbound events: persist first, then fan out to the session's members
///
/// Within one session, append and fan-out happen under the same lock, so members
/// observe events in exactly the order they were written to the log.
#[derive(Clone)]
pub struct EventBus {
    store: Arc<dyn EventStore>,
    registry: Arc<dyn SessionRegistry>,
    connection_manager: Arc<dyn ConnectionManager>,
    default_session: String,
    /// session_id -> serialization point for that session
    session_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl EventBus {
    pub fn new(
        store: Arc<dyn EventStore>,
        registry: Arc<dyn SessionRegistry>,
        connection_manager: Arc<dyn ConnectionManager>,
    ) -> Self {
        Self {
            store,
            registry,
            connection_manager,
            default_session: DEFAULT_SESSION.to_string(),
            session_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_default_session(mut self, default_session: impl Into<String>) -> Self {
        self.default_session = default_session.into();
        self
    }

    pub fn default_session(&self) -> &str {
        &self.default_session
    }

    /// Blank or missing session ids fall back to the default session
    pub fn resolve_session(&self, requested: Option<&str>) -> String {
        match requested.map(str::trim) {
            Some(session_id) if !session_id.is_empty() => session_id.to_string(),
            _ => self.default_session.clone(),
        }
    }

    /// Handle one validated event from `connection_id`
    #[instrument(skip(self, event), fields(event = event.name()))]
    pub async fn handle(&self, connection_id: &str, event: InboundEvent) -> Result<(), BusError> {
        let session_id = self.resolve_session(event.requested_session());
        debug!(
            connection_id = %connection_id,
            session_id = %session_id,
            "Handling inbound event"
        );

        match event {
            InboundEvent::Join(payload) => self.on_join(connection_id, &session_id, payload).await,
            InboundEvent::Leave(payload) => {
                self.on_leave(connection_id, &session_id, payload).await
            }
            InboundEvent::Stroke(payload) => {
                self.on_stroke(connection_id, &session_id, payload).await
            }
            InboundEvent::Clear(payload) => {
                self.on_actor_event(connection_id, &session_id, EventType::Clear, payload)
                    .await
            }
            InboundEvent::Undo(payload) => {
                self.on_actor_event(connection_id, &session_id, EventType::Undo, payload)
                    .await
            }
            InboundEvent::Chat(payload) => self.on_chat(connection_id, &session_id, payload).await,
        }
    }

    /// Transport signal: the connection dropped without leaving
    #[instrument(skip(self))]
    pub async fn disconnect(&self, connection_id: &str) {
        let departures = self.registry.on_disconnect(connection_id).await;

        for member in departures {
            let lock = self.session_lock(&member.session_id).await;
            let guard = lock.lock().await;

            let message = WebSocketMessage::user_left(&member.username);
            let announced = self
                .broadcast(&member.session_id, connection_id, Audience::Everyone, &message)
                .await;
            drop(guard);
            self.release_session_lock(&member.session_id, lock).await;

            if let Err(e) = announced {
                warn!(
                    session_id = %member.session_id,
                    connection_id = %connection_id,
                    error = %e,
                    "Failed to announce departure"
                );
            }
        }
    }

    /// Tell the originating connection why its event was not accepted
    pub async fn report_error(&self, connection_id: &str, error: &BusError) {
        warn!(connection_id = %connection_id, error = %error, "Inbound event rejected");

        if let Err(e) = self
            .send_to(connection_id, &WebSocketMessage::error(error.client_message()))
            .await
        {
            warn!(connection_id = %connection_id, error = %e, "Failed to report error");
        }
    }

    async fn on_join(
        &self,
        connection_id: &str,
        session_id: &str,
        payload: ActorPayload,
    ) -> Result<(), BusError> {
        let username = username_or_anonymous(payload.username);

        let lock = self.session_lock(session_id).await;
        let guard = lock.lock().await;

        // Membership is not part of the durable log
        let members = self
            .registry
            .join(connection_id, session_id, &username)
            .await;
        let announced = self
            .deliver(
                &members,
                connection_id,
                Audience::Everyone,
                &WebSocketMessage::user_joined(&username),
            )
            .await;
        drop(guard);
        self.release_session_lock(session_id, lock).await;
        announced?;

        let event_count = self.store.read_ordered(session_id).await?.len();
        self.send_to(
            connection_id,
            &WebSocketMessage::session_info(session_id, event_count),
        )
        .await?;

        info!(
            session_id = %session_id,
            connection_id = %connection_id,
            username = %username,
            event_count,
            "Join handled"
        );
        Ok(())
    }

    async fn on_leave(
        &self,
        connection_id: &str,
        session_id: &str,
        _payload: ActorPayload,
    ) -> Result<(), BusError> {
        let lock = self.session_lock(session_id).await;
        let guard = lock.lock().await;

        let result = match self.registry.leave(connection_id, session_id).await {
            Some(member) => self
                .broadcast(
                    session_id,
                    connection_id,
                    Audience::Everyone,
                    &WebSocketMessage::user_left(&member.username),
                )
                .await
                .map(|_| ()),
            None => Ok(()),
        };
        drop(guard);
        self.release_session_lock(session_id, lock).await;

        result
    }

    async fn on_stroke(
        &self,
        connection_id: &str,
        session_id: &str,
        payload: StrokePayload,
    ) -> Result<(), BusError> {
        let stroke = match payload.stroke {
            Some(Value::Object(stroke)) if !stroke.is_empty() => stroke,
            _ => {
                debug!(
                    session_id = %session_id,
                    connection_id = %connection_id,
                    "Dropping empty stroke"
                );
                return Ok(());
            }
        };

        self.persist_and_broadcast(
            connection_id,
            session_id,
            EventType::Stroke,
            stroke,
            Audience::EveryoneButSender,
        )
        .await
    }

    async fn on_actor_event(
        &self,
        connection_id: &str,
        session_id: &str,
        event_type: EventType,
        payload: ActorPayload,
    ) -> Result<(), BusError> {
        let body = into_payload(json!({ "by": username_or_anonymous(payload.username) }));
        self.persist_and_broadcast(
            connection_id,
            session_id,
            event_type,
            body,
            Audience::Everyone,
        )
        .await
    }

    async fn on_chat(
        &self,
        connection_id: &str,
        session_id: &str,
        payload: ChatPayload,
    ) -> Result<(), BusError> {
        let message = payload
            .message
            .ok_or_else(|| BusError::validation("chat requires a message"))?;

        let body = into_payload(json!({
            "username": username_or_anonymous(payload.username),
            "message": message,
            "timestamp": now_seconds(),
        }));
        self.persist_and_broadcast(
            connection_id,
            session_id,
            EventType::Chat,
            body,
            Audience::Everyone,
        )
        .await
    }

    async fn persist_and_broadcast(
        &self,
        connection_id: &str,
        session_id: &str,
        event_type: EventType,
        payload: Payload,
        audience: Audience,
    ) -> Result<(), BusError> {
        let lock = self.session_lock(session_id).await;
        let guard = lock.lock().await;

        let result = self
            .append_and_fan_out(connection_id, session_id, event_type, payload, audience)
            .await;
        drop(guard);
        self.release_session_lock(session_id, lock).await;

        result
    }

    /// Append to the log, then fan out. Nothing is broadcast if the append fails.
    /// Callers hold the session lock.
    async fn append_and_fan_out(
        &self,
        connection_id: &str,
        session_id: &str,
        event_type: EventType,
        payload: Payload,
        audience: Audience,
    ) -> Result<(), BusError> {
        let event: StoredEvent = self
            .store
            .append(session_id, event_type, payload)
            .await
            .map_err(|e| {
                warn!(
                    session_id = %session_id,
                    connection_id = %connection_id,
                    event_type = %event_type,
                    error = %e,
                    "Append failed, skipping broadcast"
                );
                BusError::from(e)
            })?;

        let delivered = self
            .broadcast(session_id, connection_id, audience, &WebSocketMessage::from_event(&event))
            .await?;

        debug!(
            session_id = %session_id,
            event_id = event.id,
            event_type = %event_type,
            delivered,
            "Event persisted and broadcast"
        );
        Ok(())
    }

    async fn broadcast(
        &self,
        session_id: &str,
        sender: &str,
        audience: Audience,
        message: &WebSocketMessage,
    ) -> Result<usize, BusError> {
        let members = self.registry.members_of(session_id).await;
        self.deliver(&members, sender, audience, message).await
    }

    async fn deliver(
        &self,
        members: &[Member],
        sender: &str,
        audience: Audience,
        message: &WebSocketMessage,
    ) -> Result<usize, BusError> {
        let targets: Vec<String> = members
            .iter()
            .filter(|m| audience == Audience::Everyone || m.connection_id != sender)
            .map(|m| m.connection_id.clone())
            .collect();

        let message_json = serialize(message)?;
        self.connection_manager
            .send_to_connections(&targets, &message_json)
            .await;
        Ok(targets.len())
    }

    async fn send_to(&self, connection_id: &str, message: &WebSocketMessage) -> Result<(), BusError> {
        let message_json = serialize(message)?;
        self.connection_manager
            .send_to_connection(connection_id, &message_json)
            .await;
        Ok(())
    }

    async fn session_lock(&self, session_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.session_locks.lock().await;
        locks.entry(session_id.to_string()).or_default().clone()
    }

    /// Hand back a lock from `session_lock`; the entry goes once nobody else holds it
    async fn release_session_lock(&self, session_id: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.session_locks.lock().await;
        drop(lock);
        if locks
            .get(session_id)
            .is_some_and(|held| Arc::strong_count(held) == 1)
        {
            locks.remove(session_id);
        }
    }

    #[cfg(test)]
    async fn session_lock_count(&self) -> usize {
        self.session_locks.lock().await.len()
    }
}

fn username_or_anonymous(username: Option<String>) -> String {
    username
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| ANONYMOUS_USERNAME.to_string())
}

fn into_payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        _ => Payload::new(),
    }
}

fn serialize(message: &WebSocketMessage) -> Result<String, BusError> {
    serde_json::to_string(message)
        .map_err(|e| BusError::Delivery(format!("Failed to serialize message: {}", e)))
}
