//! PostgreSQL implementation of ConversationStore.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::conversation::{MessageSender, PersistedMessage};
use crate::domain::foundation::{ConversationId, MessageId, Timestamp};
use crate::ports::{ConversationStore, StorageError};

/// PostgreSQL implementation of ConversationStore.
#[derive(Clone)]
pub struct PostgresConversationStore {
    pool: PgPool,
}

impl PostgresConversationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationStore for PostgresConversationStore {
    async fn persist_message(&self, message: &PersistedMessage) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO conversation_messages (
                id, conversation_id, sender, content, customer_name, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(message.id().as_uuid())
        .bind(message.conversation_id().as_str())
        .bind(message.from().as_str())
        .bind(message.content())
        .bind(message.customer_name())
        .bind(message.timestamp().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::database(format!("Failed to insert message: {}", e)))?;

        Ok(())
    }

    async fn list_messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<PersistedMessage>, StorageError> {
        let rows = sqlx::query(
            r#"
            SELECT id, conversation_id, sender, content, customer_name, created_at
            FROM conversation_messages
            WHERE conversation_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(conversation_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::database(format!("Failed to fetch messages: {}", e)))?;

        rows.iter().map(row_to_message).collect()
    }

    async fn delete_messages(&self, conversation_id: &ConversationId) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM conversation_messages WHERE conversation_id = $1")
            .bind(conversation_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::database(format!("Failed to delete messages: {}", e)))?;

        Ok(result.rows_affected())
    }

    async fn has_messages(&self, conversation_id: &ConversationId) -> Result<bool, StorageError> {
        let row = sqlx::query(
            "SELECT EXISTS (SELECT 1 FROM conversation_messages WHERE conversation_id = $1) AS found",
        )
        .bind(conversation_id.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StorageError::database(format!("Failed to check messages: {}", e)))?;

        Ok(row.get("found"))
    }
}

fn row_to_message(row: &PgRow) -> Result<PersistedMessage, StorageError> {
    let id: uuid::Uuid = row.get("id");
    let conversation_id: String = row.get("conversation_id");
    let sender: &str = row.get("sender");
    let content: String = row.get("content");
    let customer_name: Option<String> = row.get("customer_name");
    let created_at: chrono::DateTime<chrono::Utc> = row.get("created_at");

    let from = MessageSender::parse(sender)
        .ok_or_else(|| StorageError::corrupted(format!("Unknown sender: {}", sender)))?;
    let conversation_id = ConversationId::new(conversation_id)
        .map_err(|e| StorageError::corrupted(format!("Invalid conversation id: {}", e)))?;

    Ok(PersistedMessage::reconstitute(
        MessageId::from_uuid(id),
        conversation_id,
        from,
        content,
        customer_name,
        Timestamp::from_datetime(created_at),
    ))
}
