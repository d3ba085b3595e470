//! Storage adapters without external dependencies.

mod in_memory;

pub use in_memory::{InMemoryConversationStore, InMemoryThreadStore};
