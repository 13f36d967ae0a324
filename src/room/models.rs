use serde::{Deserialize, Serialize};

/// Display label used when a client does not supply a username
pub const ANONYMOUS_USERNAME: &str = "Anon";

/// A connection currently associated with a session
///
/// Members are ephemeral and never persisted; they live exactly as long as the
/// connection stays joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub connection_id: String,
    pub session_id: String,
    pub username: String,
}

impl Member {
    pub fn new(
        connection_id: impl Into<String>,
        session_id: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            connection_id: connection_id.into(),
            session_id: session_id.into(),
            username: username.into(),
        }
    }
}
