//! Axum routes for drafting endpoints.

use axum::routing::{get, post};
use axum::Router;

use crate::adapters::http::state::AppState;

use super::handlers::{approve_proposal, cancel_reply, create_session, get_session, stream_reply};

/// Creates routes for drafting endpoints, mounted under `/api/drafting`.
///
/// - POST /sessions - Open a session
/// - GET /sessions/:conversation_id - Session view
/// - POST /stream - Submit a message, SSE reply
/// - POST /sessions/:conversation_id/cancel - Cancel the streaming reply
/// - POST /sessions/:conversation_id/approve - Send the proposed message
pub fn drafting_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/:conversation_id", get(get_session))
        .route("/stream", post(stream_reply))
        .route("/sessions/:conversation_id/cancel", post(cancel_reply))
        .route("/sessions/:conversation_id/approve", post(approve_proposal))
}
