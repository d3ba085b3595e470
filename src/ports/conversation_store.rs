//! Conversation store port.
//!
//! Persistent, append-only storage of customer-seller messages keyed by
//! conversation id.

use async_trait::async_trait;

use crate::domain::conversation::PersistedMessage;
use crate::domain::foundation::ConversationId;

use super::StorageError;

/// Repository port for persisted conversation messages.
///
/// Implementations must ensure:
/// - `list_messages` returns messages ordered by timestamp, oldest first
/// - `delete_messages` removes every message of the conversation
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Appends a message.
    ///
    /// # Errors
    ///
    /// - `Database` on persistence failure
    async fn persist_message(&self, message: &PersistedMessage) -> Result<(), StorageError>;

    /// All messages of a conversation, oldest first.
    async fn list_messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<PersistedMessage>, StorageError>;

    /// Deletes every message of a conversation, returning how many were removed.
    async fn delete_messages(&self, conversation_id: &ConversationId) -> Result<u64, StorageError>;

    /// True if the conversation already holds at least one message.
    async fn has_messages(&self, conversation_id: &ConversationId) -> Result<bool, StorageError> {
        Ok(!self.list_messages(conversation_id).await?.is_empty())
    }
}
