use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use super::models::Member;

/// Trait for session membership operations
///
/// All operations are linearizable: a snapshot returned by `members_of` is never a
/// partially-updated member list.
#[async_trait]
pub trait SessionRegistry: Send + Sync {
    /// Adds (or replaces) the membership of `connection_id` in `session_id`.
    /// Returns the members of the session after the join.
    async fn join(&self, connection_id: &str, session_id: &str, username: &str) -> Vec<Member>;

    /// Removes the membership, returning the removed record.
    /// Leaving a session the connection is not part of is a no-op returning `None`.
    async fn leave(&self, connection_id: &str, session_id: &str) -> Option<Member>;

    /// Current members of a session, ordered by connection id
    async fn members_of(&self, session_id: &str) -> Vec<Member>;

    /// Removes the connection from every session it belonged to and returns the
    /// removed memberships so departures can be announced.
    async fn on_disconnect(&self, connection_id: &str) -> Vec<Member>;
}

#[derive(Debug, Default)]
struct Rooms {
    /// session_id -> connection_id -> member
    sessions: HashMap<String, BTreeMap<String, Member>>,
    /// connection_id -> sessions it has joined
    by_connection: HashMap<String, BTreeSet<String>>,
}

impl Rooms {
    fn remove(&mut self, connection_id: &str, session_id: &str) -> Option<Member> {
        let members = self.sessions.get_mut(session_id)?;
        let removed = members.remove(connection_id)?;

        // Sessions without members hold no state worth keeping
        if members.is_empty() {
            self.sessions.remove(session_id);
        }

        if let Some(joined) = self.by_connection.get_mut(connection_id) {
            joined.remove(session_id);
            if joined.is_empty() {
                self.by_connection.remove(connection_id);
            }
        }

        Some(removed)
    }
}

/// In-process session registry guarded by a single RwLock
#[derive(Debug, Default)]
pub struct InMemorySessionRegistry {
    rooms: RwLock<Rooms>,
}

impl InMemorySessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions that currently have at least one member
    pub async fn active_session_count(&self) -> usize {
        self.rooms.read().await.sessions.len()
    }

    /// Sessions the connection currently belongs to
    pub async fn sessions_of(&self, connection_id: &str) -> Vec<String> {
        self.rooms
            .read()
            .await
            .by_connection
            .get(connection_id)
            .map(|sessions| sessions.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SessionRegistry for InMemorySessionRegistry {
    #[instrument(skip(self))]
    async fn join(&self, connection_id: &str, session_id: &str, username: &str) -> Vec<Member> {
        let mut rooms = self.rooms.write().await;

        let members = rooms.sessions.entry(session_id.to_string()).or_default();
        let replaced = members
            .insert(
                connection_id.to_string(),
                Member::new(connection_id, session_id, username),
            )
            .is_some();
        let snapshot: Vec<Member> = members.values().cloned().collect();

        rooms
            .by_connection
            .entry(connection_id.to_string())
            .or_default()
            .insert(session_id.to_string());

        info!(
            session_id = %session_id,
            connection_id = %connection_id,
            username = %username,
            replaced,
            member_count = snapshot.len(),
            "Member joined session"
        );

        snapshot
    }

    #[instrument(skip(self))]
    async fn leave(&self, connection_id: &str, session_id: &str) -> Option<Member> {
        let removed = self.rooms.write().await.remove(connection_id, session_id);

        match &removed {
            Some(member) => info!(
                session_id = %session_id,
                connection_id = %connection_id,
                username = %member.username,
                "Member left session"
            ),
            None => debug!(
                session_id = %session_id,
                connection_id = %connection_id,
                "Leave for non-member ignored"
            ),
        }

        removed
    }

    async fn members_of(&self, session_id: &str) -> Vec<Member> {
        self.rooms
            .read()
            .await
            .sessions
            .get(session_id)
            .map(|members| members.values().cloned().collect())
            .unwrap_or_default()
    }

    #[instrument(skip(self))]
    async fn on_disconnect(&self, connection_id: &str) -> Vec<Member> {
        let mut rooms = self.rooms.write().await;

        let joined: Vec<String> = rooms
            .by_connection
            .get(connection_id)
            .map(|sessions| sessions.iter().cloned().collect())
            .unwrap_or_default();

        let removed: Vec<Member> = joined
            .iter()
            .filter_map(|session_id| rooms.remove(connection_id, session_id))
            .collect();

        info!(
            connection_id = %connection_id,
            sessions_left = removed.len(),
            "Connection removed from all sessions"
        );

        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn connection_ids(members: &[Member]) -> Vec<&str> {
        members.iter().map(|m| m.connection_id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_join_returns_post_join_members() {
        let registry = InMemorySessionRegistry::new();

        let after_a = registry.join("conn-a", "room1", "alice").await;
        assert_eq!(connection_ids(&after_a), vec!["conn-a"]);

        let after_b = registry.join("conn-b", "room1", "bob").await;
        assert_eq!(connection_ids(&after_b), vec!["conn-a", "conn-b"]);
    }

    #[tokio::test]
    async fn test_rejoin_replaces_membership() {
        let registry = InMemorySessionRegistry::new();
        registry.join("conn-a", "room1", "alice").await;

        let members = registry.join("conn-a", "room1", "alice-renamed").await;

        assert_eq!(members.len(), 1);
        assert_eq!(members[0].username, "alice-renamed");
    }

    #[tokio::test]
    async fn test_leave_non_member_is_noop() {
        let registry = InMemorySessionRegistry::new();
        registry.join("conn-a", "room1", "alice").await;

        assert!(registry.leave("conn-z", "room1").await.is_none());
        assert!(registry.leave("conn-a", "other-room").await.is_none());
        assert_eq!(registry.members_of("room1").await.len(), 1);
    }

    #[tokio::test]
    async fn test_leave_removes_and_collects_empty_session() {
        let registry = InMemorySessionRegistry::new();
        registry.join("conn-a", "room1", "alice").await;

        let removed = registry.leave("conn-a", "room1").await.unwrap();
        assert_eq!(removed.username, "alice");
        assert!(registry.members_of("room1").await.is_empty());
        assert_eq!(registry.active_session_count().await, 0);
        assert!(registry.sessions_of("conn-a").await.is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_removes_from_every_session() {
        let registry = InMemorySessionRegistry::new();
        registry.join("conn-a", "room1", "alice").await;
        registry.join("conn-a", "room2", "alice").await;
        registry.join("conn-b", "room1", "bob").await;

        let removed = registry.on_disconnect("conn-a").await;

        let mut sessions: Vec<&str> = removed.iter().map(|m| m.session_id.as_str()).collect();
        sessions.sort();
        assert_eq!(sessions, vec!["room1", "room2"]);
        assert_eq!(connection_ids(&registry.members_of("room1").await), vec!["conn-b"]);
        assert!(registry.members_of("room2").await.is_empty());

        // A second disconnect has nothing left to remove
        assert!(registry.on_disconnect("conn-a").await.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_joins_keep_member_set_intact() {
        let registry = Arc::new(InMemorySessionRegistry::new());
        let mut handles = Vec::new();
        for i in 0..50 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                registry
                    .join(&format!("conn-{i:02}"), "crowded", &format!("user-{i}"))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(registry.members_of("crowded").await.len(), 50);
    }
}
