//! HTTP handlers for conversation endpoints.

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::adapters::http::error::DraftingApiError;
use crate::adapters::http::state::AppState;
use crate::application::SaveMessageCommand;
use crate::domain::foundation::ConversationId;

use super::dto::{ClearResponse, MessageView, SaveMessageRequest, SavedMessageResponse};

// ════════════════════════════════════════════════════════════════════════════════
// POST /api/conversations/messages
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/conversations/messages - Save a message without drafting.
///
/// # Errors
/// - 400 Bad Request: Blank content or malformed conversation id
pub async fn save_message(
    State(state): State<AppState>,
    Json(request): Json<SaveMessageRequest>,
) -> Result<impl IntoResponse, DraftingApiError> {
    let command = SaveMessageCommand {
        conversation_id: ConversationId::new(request.conversation_id)?,
        from: request.from,
        content: request.content,
        customer_name: request.customer_name,
    };

    let saved = state.manager.save_message(command).await?;
    Ok((StatusCode::CREATED, Json(SavedMessageResponse::from(saved))))
}

// ════════════════════════════════════════════════════════════════════════════════
// GET /api/conversations/:conversation_id/messages
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/conversations/:conversation_id/messages - Messages, oldest first.
pub async fn list_messages(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> Result<Json<Vec<MessageView>>, DraftingApiError> {
    let conversation_id = ConversationId::new(conversation_id)?;
    let messages = state.manager.list_messages(&conversation_id).await?;
    Ok(Json(messages.iter().map(MessageView::from).collect()))
}

// ════════════════════════════════════════════════════════════════════════════════
// DELETE /api/conversations/:conversation_id
// ════════════════════════════════════════════════════════════════════════════════

/// DELETE /api/conversations/:conversation_id - Clear messages and threads.
///
/// Any streaming reply is cancelled first. The session continues on the
/// returned conversation id.
pub async fn clear_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> Result<Json<ClearResponse>, DraftingApiError> {
    let conversation_id = ConversationId::new(conversation_id)?;
    let outcome = state.manager.clear(&conversation_id).await?;
    Ok(Json(ClearResponse::from(outcome)))
}
