//! Axum routes for conversation endpoints.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::adapters::http::state::AppState;

use super::handlers::{clear_conversation, list_messages, save_message};

/// Creates routes for conversation endpoints, mounted under `/api/conversations`.
///
/// - POST /messages - Save a message
/// - GET /:conversation_id/messages - List messages
/// - DELETE /:conversation_id - Clear the conversation
pub fn conversation_routes() -> Router<AppState> {
    Router::new()
        .route("/messages", post(save_message))
        .route("/:conversation_id/messages", get(list_messages))
        .route("/:conversation_id", delete(clear_conversation))
}
