//! Persisted customer-seller messages.
//!
//! Messages are immutable once written and ordered by timestamp. The drafting
//! flow only ever writes customer messages (on approval); seller messages
//! arrive through the direct save path.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ConversationId, DomainError, MessageId, Timestamp};

/// Party that authored a persisted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageSender {
    #[default]
    Customer,
    Seller,
}

impl MessageSender {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageSender::Customer => "customer",
            MessageSender::Seller => "seller",
        }
    }

    /// Parses the stored representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "customer" => Some(MessageSender::Customer),
            "seller" => Some(MessageSender::Seller),
            _ => None,
        }
    }
}

/// A message in the persistent conversation.
///
/// # Invariants
///
/// - `content` is non-blank (validated at construction)
/// - `timestamp` is set at construction and never changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedMessage {
    id: MessageId,
    conversation_id: ConversationId,
    from: MessageSender,
    content: String,
    customer_name: Option<String>,
    timestamp: Timestamp,
}

impl PersistedMessage {
    /// Creates a new message stamped with the current time.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if content is blank
    pub fn new(
        conversation_id: ConversationId,
        from: MessageSender,
        content: impl Into<String>,
        customer_name: Option<String>,
    ) -> Result<Self, DomainError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(DomainError::validation(
                "content",
                "Message content cannot be empty",
            ));
        }

        Ok(Self {
            id: MessageId::new(),
            conversation_id,
            from,
            content,
            customer_name: customer_name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            timestamp: Timestamp::now(),
        })
    }

    /// A customer message, as written by the approval transition.
    pub fn from_customer(
        conversation_id: ConversationId,
        content: impl Into<String>,
        customer_name: Option<String>,
    ) -> Result<Self, DomainError> {
        Self::new(conversation_id, MessageSender::Customer, content, customer_name)
    }

    /// Reconstitutes a message from storage (no validation).
    pub fn reconstitute(
        id: MessageId,
        conversation_id: ConversationId,
        from: MessageSender,
        content: String,
        customer_name: Option<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id,
            conversation_id,
            from,
            content,
            customer_name,
            timestamp,
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    pub fn from(&self) -> MessageSender {
        self.from
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn customer_name(&self) -> Option<&str> {
        self.customer_name.as_deref()
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation() -> ConversationId {
        ConversationId::new("conv-1").unwrap()
    }

    #[test]
    fn blank_content_is_rejected() {
        let err = PersistedMessage::from_customer(conversation(), "  \n", None).unwrap_err();
        assert_eq!(err.details.get("field").map(String::as_str), Some("content"));
    }

    #[test]
    fn blank_customer_name_is_dropped() {
        let msg = PersistedMessage::from_customer(conversation(), "Bonjour", Some(" ".into()))
            .unwrap();
        assert_eq!(msg.customer_name(), None);
        assert_eq!(msg.from(), MessageSender::Customer);
    }

    #[test]
    fn content_is_kept_verbatim() {
        let msg = PersistedMessage::new(conversation(), MessageSender::Seller, " Salut ", None)
            .unwrap();
        assert_eq!(msg.content(), " Salut ");
    }

    #[test]
    fn sender_round_trips_through_storage_form() {
        for sender in [MessageSender::Customer, MessageSender::Seller] {
            assert_eq!(MessageSender::parse(sender.as_str()), Some(sender));
        }
        assert_eq!(MessageSender::parse("admin"), None);
    }
}
