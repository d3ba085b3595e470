//! Thread store port.
//!
//! Ephemeral history of drafting threads. Records are keyed by thread
//! identity; because every identity is prefixed by its conversation id, all
//! threads of a conversation can be removed with one prefix delete.

use async_trait::async_trait;

use crate::domain::conversation::ThreadRecord;
use crate::domain::foundation::ThreadIdentity;

use super::StorageError;

/// Repository port for drafting thread history.
#[async_trait]
pub trait ThreadStore: Send + Sync {
    /// Appends one completed turn to a thread.
    async fn append(&self, record: &ThreadRecord) -> Result<(), StorageError>;

    /// History of one thread, oldest first.
    async fn list_thread_history(
        &self,
        thread_id: &ThreadIdentity,
    ) -> Result<Vec<ThreadRecord>, StorageError>;

    /// Deletes every record of the thread `prefix`, or of every thread of
    /// the conversation `prefix`.
    ///
    /// The match is anchored on the thread separator: clearing `shop` leaves
    /// the threads of `shop2` alone.
    ///
    /// Returns the number of deleted records.
    async fn delete_threads_by_prefix(&self, prefix: &str) -> Result<u64, StorageError>;
}
