//! HTTP handlers for drafting endpoints.
//!
//! These handlers connect Axum routes to the [`DraftSessionManager`].
//!
//! [`DraftSessionManager`]: crate::application::DraftSessionManager

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::{DraftingError, SubmitCommand};
use crate::domain::foundation::ConversationId;

use crate::adapters::http::error::DraftingApiError;
use crate::adapters::http::state::AppState;
use super::dto::{
    ApproveResponse, CancelResponse, CreateSessionRequest, SessionResponse, StreamRequest,
};
use super::sse::draft_event_response;

// ════════════════════════════════════════════════════════════════════════════════
// POST /api/drafting/sessions
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/drafting/sessions - Open a session on a new conversation.
pub async fn create_session(
    State(state): State<AppState>,
    body: Option<Json<CreateSessionRequest>>,
) -> impl IntoResponse {
    let request = body.map(|Json(req)| req).unwrap_or_default();
    let snapshot = state.manager.open_session(request.customer_name).await;
    (StatusCode::CREATED, Json(SessionResponse::from(snapshot)))
}

// ════════════════════════════════════════════════════════════════════════════════
// GET /api/drafting/sessions/:conversation_id
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/drafting/sessions/:conversation_id - Current session view.
///
/// # Errors
/// - 400 Bad Request: Malformed conversation id
/// - 404 Not Found: No session for this conversation
pub async fn get_session(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> Result<Json<SessionResponse>, DraftingApiError> {
    let conversation_id = ConversationId::new(conversation_id)?;
    let snapshot = state.manager.snapshot(&conversation_id).await?;
    Ok(Json(SessionResponse::from(snapshot)))
}

// ════════════════════════════════════════════════════════════════════════════════
// POST /api/drafting/stream
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/drafting/stream - Submit a customer message and stream the reply.
///
/// Rejections happen before the stream opens and come back as JSON errors.
/// Once open, the stream carries `start`, `token`*, then one of `end`,
/// `error` or `cancelled`.
///
/// # Errors
/// - 400 Bad Request: Empty message or malformed conversation id
/// - 409 Conflict: A reply is already streaming, or `threadId` is stale
/// - 422 Unprocessable Entity: Session is approving
pub async fn stream_reply(
    State(state): State<AppState>,
    Json(request): Json<StreamRequest>,
) -> Result<Response, DraftingApiError> {
    let conversation_id = ConversationId::new(request.conversation_id)?;

    let mut command = SubmitCommand::new(conversation_id, request.message);
    if let Some(thread_id) = request.thread_id {
        command = command.with_thread_id(thread_id);
    }
    if let Some(name) = request.customer_name {
        command = command.with_customer_name(name);
    }

    let receiver = state.manager.submit(command).await?;
    Ok(draft_event_response(receiver).into_response())
}

// ════════════════════════════════════════════════════════════════════════════════
// POST /api/drafting/sessions/:conversation_id/cancel
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/drafting/sessions/:conversation_id/cancel - Stop the streaming reply.
///
/// Accepted even when nothing is streaming; `cancelled` tells which.
pub async fn cancel_reply(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> Result<impl IntoResponse, DraftingApiError> {
    let conversation_id = ConversationId::new(conversation_id)?;
    let cancelled = state.manager.cancel(&conversation_id).await?;
    Ok((StatusCode::ACCEPTED, Json(CancelResponse { cancelled })))
}

// ════════════════════════════════════════════════════════════════════════════════
// POST /api/drafting/sessions/:conversation_id/approve
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/drafting/sessions/:conversation_id/approve - Send the proposal.
///
/// # Errors
/// - 404 Not Found: No session for this conversation
/// - 409 Conflict: A reply is streaming
/// - 422 Unprocessable Entity: Nothing approvable
/// - 500 Internal Server Error: The message could not be saved
pub async fn approve_proposal(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> Result<Json<ApproveResponse>, DraftingApiError> {
    let conversation_id = ConversationId::new(conversation_id)?;
    let receipt = state
        .manager
        .approve(&conversation_id)
        .await
        .map_err(|e| match e {
            DraftingError::InvalidState { .. } => DraftingError::NoProposal,
            other => other,
        })?;
    Ok(Json(ApproveResponse::from(receipt)))
}
