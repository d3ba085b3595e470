//! PostgreSQL adapters - Database implementations for the storage ports.
//!
//! - `PostgresConversationStore` - Persisted customer-seller messages
//! - `PostgresThreadStore` - Drafting thread history with prefix deletes
//! - `connect` - Pool creation plus migrations

mod conversation_store;
mod pool;
mod thread_store;

pub use conversation_store::PostgresConversationStore;
pub use pool::connect;
pub use thread_store::PostgresThreadStore;
