//! Request and response bodies for the drafting endpoints.

use serde::{Deserialize, Serialize};

use crate::application::{ApprovalReceipt, SessionSnapshot};
use crate::domain::drafting::{DraftSessionState, DraftTurn, ProposedMessage};

// ════════════════════════════════════════════════════════════════════════════════
// Requests
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /api/drafting/sessions`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub customer_name: Option<String>,
}

/// Body of `POST /api/drafting/stream`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamRequest {
    pub message: String,
    pub conversation_id: String,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Responses
// ════════════════════════════════════════════════════════════════════════════════

/// A drafting session as seen by the UI.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub conversation_id: String,
    pub thread_id: String,
    pub state: DraftSessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    pub turns: Vec<DraftTurn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proposal: Option<ProposedMessage>,
    pub updated_at: String,
}

impl From<SessionSnapshot> for SessionResponse {
    fn from(snapshot: SessionSnapshot) -> Self {
        Self {
            conversation_id: snapshot.conversation_id.to_string(),
            thread_id: snapshot.thread_id.to_string(),
            state: snapshot.state,
            customer_name: snapshot.customer_name,
            turns: snapshot.turns,
            proposal: snapshot.proposal,
            updated_at: snapshot.updated_at.to_rfc3339(),
        }
    }
}

/// Result of `POST .../cancel`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelResponse {
    /// False when no reply was streaming.
    pub cancelled: bool,
}

/// Result of `POST .../approve`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveResponse {
    pub message_id: String,
    pub timestamp: String,
    pub content: String,
    /// Thread to use for the next drafting round.
    pub thread_id: String,
}

impl From<ApprovalReceipt> for ApproveResponse {
    fn from(receipt: ApprovalReceipt) -> Self {
        Self {
            message_id: receipt.message_id.to_string(),
            timestamp: receipt.timestamp.to_rfc3339(),
            content: receipt.content,
            thread_id: receipt.thread_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::drafting::DraftSession;
    use crate::domain::foundation::ConversationId;

    #[test]
    fn stream_request_deserializes_camel_case() {
        let json = r#"{"message":"Colis cassé","conversationId":"conv-1","threadId":"conv-1-ai-abc"}"#;
        let req: StreamRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.conversation_id, "conv-1");
        assert_eq!(req.thread_id.as_deref(), Some("conv-1-ai-abc"));
        assert!(req.customer_name.is_none());
    }

    #[test]
    fn create_session_request_accepts_empty_body() {
        let req: CreateSessionRequest = serde_json::from_str("{}").unwrap();
        assert!(req.customer_name.is_none());
    }

    #[test]
    fn session_response_serializes_camel_case() {
        let conv = ConversationId::new("conv-1").unwrap();
        let session = DraftSession::open(conv, Some("Alice".to_string()));
        let response = SessionResponse::from(SessionSnapshot::from(&session));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["conversationId"], "conv-1");
        assert_eq!(json["customerName"], "Alice");
        assert_eq!(json["state"], "idle");
        assert!(json["threadId"].as_str().unwrap().starts_with("conv-1-ai-"));
        assert!(json.get("proposal").is_none());
    }
}
