//! In-memory conversation and thread stores.
//!
//! Used for development, tests and single-process deployments without a
//! database. Nothing survives a restart.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::domain::conversation::{PersistedMessage, ThreadRecord};
use crate::domain::foundation::{ConversationId, ThreadIdentity};
use crate::ports::{ConversationStore, StorageError, ThreadStore};

/// In-memory implementation of the ConversationStore port.
///
/// Messages are kept in insertion order, which is also timestamp order.
#[derive(Default)]
pub struct InMemoryConversationStore {
    messages: RwLock<Vec<PersistedMessage>>,
    fail_writes: AtomicBool,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `persist_message` fail.
    ///
    /// Useful for exercising persistence-failure paths in tests.
    pub fn with_failing_writes(self) -> Self {
        self.fail_writes.store(true, Ordering::SeqCst);
        self
    }

    pub fn set_failing_writes(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    /// Total number of stored messages across conversations.
    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn persist_message(&self, message: &PersistedMessage) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::database("in-memory store rejects writes"));
        }
        self.messages.write().await.push(message.clone());
        Ok(())
    }

    async fn list_messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<PersistedMessage>, StorageError> {
        let messages = self.messages.read().await;
        let mut found: Vec<PersistedMessage> = messages
            .iter()
            .filter(|m| m.conversation_id() == conversation_id)
            .cloned()
            .collect();
        found.sort_by_key(|m| m.timestamp());
        Ok(found)
    }

    async fn delete_messages(&self, conversation_id: &ConversationId) -> Result<u64, StorageError> {
        let mut messages = self.messages.write().await;
        let before = messages.len();
        messages.retain(|m| m.conversation_id() != conversation_id);
        Ok((before - messages.len()) as u64)
    }

    async fn has_messages(&self, conversation_id: &ConversationId) -> Result<bool, StorageError> {
        Ok(self
            .messages
            .read()
            .await
            .iter()
            .any(|m| m.conversation_id() == conversation_id))
    }
}

/// In-memory implementation of the ThreadStore port.
///
/// Records every prefix passed to `delete_threads_by_prefix` so callers can
/// verify cleanup.
#[derive(Default)]
pub struct InMemoryThreadStore {
    records: RwLock<Vec<ThreadRecord>>,
    prefix_deletions: RwLock<Vec<String>>,
}

impl InMemoryThreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefixes passed to `delete_threads_by_prefix`, in call order.
    pub async fn prefix_deletions(&self) -> Vec<String> {
        self.prefix_deletions.read().await.clone()
    }

    /// Total number of stored records across threads.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ThreadStore for InMemoryThreadStore {
    async fn append(&self, record: &ThreadRecord) -> Result<(), StorageError> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn list_thread_history(
        &self,
        thread_id: &ThreadIdentity,
    ) -> Result<Vec<ThreadRecord>, StorageError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| &r.thread_id == thread_id)
            .cloned()
            .collect())
    }

    async fn delete_threads_by_prefix(&self, prefix: &str) -> Result<u64, StorageError> {
        self.prefix_deletions.write().await.push(prefix.to_string());

        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| !r.thread_id.matches_prefix(prefix));
        Ok((before - records.len()) as u64)
    }
}
