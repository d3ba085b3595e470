//! HTTP adapter for drafting endpoints.
//!
//! Provides session management, the SSE reply stream, cancellation and
//! approval of the proposed message.

pub mod dto;
pub mod handlers;
pub mod routes;
pub mod sse;

pub use dto::{ApproveResponse, CancelResponse, CreateSessionRequest, SessionResponse, StreamRequest};
pub use routes::drafting_routes;
