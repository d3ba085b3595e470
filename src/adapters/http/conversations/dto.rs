//! Request and response bodies for the conversation endpoints.

use serde::{Deserialize, Serialize};

use crate::application::{ClearOutcome, SavedMessage};
use crate::domain::conversation::{MessageSender, PersistedMessage};

/// Body of `POST /api/conversations/messages`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveMessageRequest {
    pub conversation_id: String,
    pub content: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    /// Defaults to the customer.
    #[serde(default)]
    pub from: MessageSender,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedMessageResponse {
    pub message_id: String,
    pub timestamp: String,
}

impl From<SavedMessage> for SavedMessageResponse {
    fn from(saved: SavedMessage) -> Self {
        Self {
            message_id: saved.message_id.to_string(),
            timestamp: saved.timestamp.to_rfc3339(),
        }
    }
}

/// One persisted message.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: String,
    pub from: MessageSender,
    pub content: String,
    pub timestamp: String,
    pub customer_name: Option<String>,
}

impl From<&PersistedMessage> for MessageView {
    fn from(message: &PersistedMessage) -> Self {
        Self {
            id: message.id().to_string(),
            from: message.from(),
            content: message.content().to_string(),
            timestamp: message.timestamp().to_rfc3339(),
            customer_name: message.customer_name().map(str::to_string),
        }
    }
}

/// Result of `DELETE /api/conversations/:conversation_id`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearResponse {
    pub deleted_messages: u64,
    pub deleted_thread_records: u64,
    /// Conversation the session continues on.
    pub conversation_id: String,
    pub thread_id: String,
}

impl From<ClearOutcome> for ClearResponse {
    fn from(outcome: ClearOutcome) -> Self {
        Self {
            deleted_messages: outcome.deleted_messages,
            deleted_thread_records: outcome.deleted_thread_records,
            conversation_id: outcome.conversation_id.to_string(),
            thread_id: outcome.thread_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ConversationId;

    #[test]
    fn save_request_defaults_sender_to_customer() {
        let json = r#"{"conversationId":"conv-1","content":"Bonjour"}"#;
        let req: SaveMessageRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.from, MessageSender::Customer);
    }

    #[test]
    fn message_view_serializes_camel_case() {
        let message = PersistedMessage::from_customer(
            ConversationId::new("conv-1").unwrap(),
            "Bonjour",
            Some("Alice".to_string()),
        )
        .unwrap();

        let json = serde_json::to_value(MessageView::from(&message)).unwrap();
        assert_eq!(json["from"], "customer");
        assert_eq!(json["customerName"], "Alice");
        assert_eq!(json["content"], "Bonjour");
    }
}
