//! Reply Generator Port - Interface for the assistant that drafts replies.
//!
//! The drafting session hands one customer message plus a thread identity to
//! a generator and consumes the reply as an ordered stream of fragments.
//!
//! # Stream contract
//!
//! - Fragments arrive in order and are appended verbatim
//! - A reply is complete only when a chunk carries a `finish_reason`
//! - A stream that simply ends without that signal is an error
//!   ([`AIError::IncompleteStream`]), never a short reply
//!
//! # Example
//!
//! ```ignore
//! let mut stream = generator.generate_reply(request).await?;
//! while let Some(chunk) = stream.next().await {
//!     let chunk = chunk?;
//!     session.append_fragment(&chunk.delta)?;
//!     if chunk.is_final() { break; }
//! }
//! ```

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use crate::domain::foundation::ThreadIdentity;

/// Ordered stream of reply fragments.
pub type ReplyStream = Pin<Box<dyn Stream<Item = Result<ReplyChunk, AIError>> + Send>>;

/// Port for the assistant reply generation.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Starts generating the next assistant reply on a drafting thread.
    async fn generate_reply(&self, request: ReplyRequest) -> Result<ReplyStream, AIError>;

    /// Provider name and model, for logs and health output.
    fn provider_info(&self) -> ProviderInfo;
}

/// Request for the next assistant reply.
#[derive(Debug, Clone)]
pub struct ReplyRequest {
    /// The customer's new message.
    pub message: String,
    /// Drafting thread the reply belongs to.
    pub thread_id: ThreadIdentity,
    /// Extra instructions and seller hints for this turn.
    pub conversation_context: Option<String>,
    pub customer_name: Option<String>,
    /// Follow-up turn: do not re-introduce or repeat seller hints.
    pub disable_seller_hints: bool,
}

impl ReplyRequest {
    pub fn new(message: impl Into<String>, thread_id: ThreadIdentity) -> Self {
        Self {
            message: message.into(),
            thread_id,
            conversation_context: None,
            customer_name: None,
            disable_seller_hints: false,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.conversation_context = Some(context.into());
        self
    }

    pub fn with_customer_name(mut self, name: Option<String>) -> Self {
        self.customer_name = name;
        self
    }

    pub fn with_seller_hints_disabled(mut self, disabled: bool) -> Self {
        self.disable_seller_hints = disabled;
        self
    }
}

/// Reason the generator stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural end of reply.
    Stop,
    /// Hit the token limit; the reply may be truncated.
    Length,
    /// Provider filtered the content.
    ContentFilter,
}

/// One streamed fragment of a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyChunk {
    pub delta: String,
    /// If present, the reply is complete.
    pub finish_reason: Option<FinishReason>,
}

impl ReplyChunk {
    /// Creates a content chunk.
    pub fn content(delta: impl Into<String>) -> Self {
        Self {
            delta: delta.into(),
            finish_reason: None,
        }
    }

    /// Creates the end-of-stream chunk.
    pub fn finished(reason: FinishReason) -> Self {
        Self {
            delta: String::new(),
            finish_reason: Some(reason),
        }
    }

    /// Returns true if this is the final chunk.
    pub fn is_final(&self) -> bool {
        self.finish_reason.is_some()
    }
}

/// Provider information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub name: String,
    pub model: String,
}

impl ProviderInfo {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
        }
    }
}

/// Reply generation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AIError {
    /// Rate limited by provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    /// Content was filtered for safety.
    #[error("content filtered: {reason}")]
    ContentFiltered { reason: String },

    /// Provider is unavailable.
    #[error("provider unavailable: {message}")]
    Unavailable { message: String },

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Failed to parse provider response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid request configuration.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u32 },

    /// The stream ended without a completion signal.
    #[error("stream ended without completion signal")]
    IncompleteStream,
}

impl AIError {
    /// Creates a rate limited error.
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    /// Creates a content filtered error.
    pub fn content_filtered(reason: impl Into<String>) -> Self {
        Self::ContentFiltered {
            reason: reason.into(),
        }
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AIError::RateLimited { .. }
                | AIError::Unavailable { .. }
                | AIError::Network(_)
                | AIError::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ConversationId;

    #[test]
    fn request_builder_sets_fields() {
        let thread = ThreadIdentity::derive(&ConversationId::new("conv-1").unwrap());
        let request = ReplyRequest::new("Bonjour", thread.clone())
            .with_context("Hints")
            .with_customer_name(Some("Alice".into()))
            .with_seller_hints_disabled(true);

        assert_eq!(request.message, "Bonjour");
        assert_eq!(request.thread_id, thread);
        assert_eq!(request.conversation_context.as_deref(), Some("Hints"));
        assert_eq!(request.customer_name.as_deref(), Some("Alice"));
        assert!(request.disable_seller_hints);
    }

    #[test]
    fn only_finished_chunks_are_final() {
        assert!(!ReplyChunk::content("a").is_final());
        assert!(ReplyChunk::finished(FinishReason::Stop).is_final());
    }

    #[test]
    fn transient_errors_are_retryable() {
        assert!(AIError::rate_limited(5).is_retryable());
        assert!(AIError::network("reset").is_retryable());
        assert!(AIError::Timeout { timeout_secs: 3 }.is_retryable());
        assert!(!AIError::AuthenticationFailed.is_retryable());
        assert!(!AIError::IncompleteStream.is_retryable());
    }

    #[test]
    fn incomplete_stream_message() {
        assert_eq!(
            AIError::IncompleteStream.to_string(),
            "stream ended without completion signal"
        );
    }
}
