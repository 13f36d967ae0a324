use axum::{
    extract::{Path, Query, State},
    response::Html,
    Json,
};
use tracing::{info, instrument};

use super::types::{LandingQuery, ReplayResponse};
use crate::shared::{AppError, AppState};

/// HTTP handler for replaying a session's history
///
/// GET /api/replay/{session_id}
/// Returns every persisted event of the session in acceptance order
#[instrument(name = "replay_session", skip(state))]
pub async fn replay_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ReplayResponse>, AppError> {
    if session_id.trim().is_empty() {
        return Err(AppError::BadRequest(
            "session id must not be blank".to_string(),
        ));
    }

    let replay = state.replay_builder.replay(&session_id).await?;
    info!(
        session_id = %session_id,
        event_count = replay.events.len(),
        "Replay served"
    );

    Ok(Json(replay))
}

/// Landing page
///
/// GET /?session={session_id}
#[instrument(name = "index", skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<LandingQuery>,
) -> Html<String> {
    let session_id = escape_html(&state.event_bus.resolve_session(query.session.as_deref()));

    Html(format!(
        "<!doctype html>\n\
         <html>\n\
         <head><meta charset=\"utf-8\"><title>LiveBoard - {session_id}</title></head>\n\
         <body data-session-id=\"{session_id}\">\n\
         <h1>LiveBoard</h1>\n\
         <p>Session <code>{session_id}</code></p>\n\
         <p>Real-time channel: <code>/ws</code></p>\n\
         <p>History: <a href=\"/api/replay/{session_id}\">/api/replay/{session_id}</a></p>\n\
         </body>\n\
         </html>\n"
    ))
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
