//! HTTP adapter for conversation endpoints.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{ClearResponse, MessageView, SaveMessageRequest, SavedMessageResponse};
pub use routes::conversation_routes;
