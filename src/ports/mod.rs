//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Drafting Ports
//!
//! - `ReplyGenerator` - Streams the assistant's next reply on a drafting thread
//! - `KnowledgeRetriever` - Fetches knowledge sections for seller hints
//!
//! ## Storage Ports
//!
//! - `ConversationStore` - Persistent customer-seller messages
//! - `ThreadStore` - Ephemeral drafting thread history, prefix-deletable

mod conversation_store;
mod knowledge_retriever;
mod reply_generator;
mod storage_error;
mod thread_store;

pub use conversation_store::ConversationStore;
pub use knowledge_retriever::{KnowledgeRetriever, RetrievalError};
pub use reply_generator::{
    AIError, FinishReason, ProviderInfo, ReplyChunk, ReplyGenerator, ReplyRequest, ReplyStream,
};
pub use storage_error::StorageError;
pub use thread_store::ThreadStore;
