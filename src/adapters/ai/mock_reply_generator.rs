//! Mock reply generator for testing.
//!
//! Scripted replies are consumed in order. Each reply is streamed as
//! whitespace-terminated fragments whose concatenation is the exact script,
//! so proposal markers and line breaks survive.
//!
//! # Example
//!
//! ```ignore
//! let generator = MockReplyGenerator::new()
//!     .with_reply("📝 Message proposé : Bonjour")
//!     .with_error(AIError::unavailable("down"));
//! ```

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, FinishReason, ProviderInfo, ReplyChunk, ReplyGenerator, ReplyRequest, ReplyStream,
};

/// Reply returned when the script is exhausted.
pub const DEFAULT_MOCK_REPLY: &str = "Mock reply";

/// One scripted generator behaviour.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Streams the text, then a `Stop` chunk.
    Complete(String),
    /// Streams the text, then ends without a completion signal.
    Truncated(String),
    /// Streams the text, then never yields again.
    Hanging(String),
    /// Fails before streaming anything.
    Error(AIError),
    /// Streams the text, then yields an error.
    FailMidway { text: String, error: AIError },
}

/// Configurable mock implementation of the ReplyGenerator port.
#[derive(Debug, Clone)]
pub struct MockReplyGenerator {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    calls: Arc<Mutex<Vec<ReplyRequest>>>,
    info: ProviderInfo,
    /// Delay before the stream opens and between fragments.
    delay: Duration,
}

impl Default for MockReplyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MockReplyGenerator {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            info: ProviderInfo::new("mock", "mock-drafter-1"),
            delay: Duration::ZERO,
        }
    }

    /// Queues a complete reply.
    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.with_script(MockReply::Complete(text.into()))
    }

    /// Queues an up-front failure.
    pub fn with_error(self, error: AIError) -> Self {
        self.with_script(MockReply::Error(error))
    }

    /// Queues any scripted behaviour.
    pub fn with_script(self, reply: MockReply) -> Self {
        self.push(reply);
        self
    }

    /// Queues a behaviour on a shared generator.
    pub fn push(&self, reply: MockReply) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// All requests received, oldest first.
    pub fn calls(&self) -> Vec<ReplyRequest> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn next_reply(&self) -> MockReply {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| MockReply::Complete(DEFAULT_MOCK_REPLY.to_string()))
    }
}

/// Splits text into fragments that concatenate back to the input.
fn fragments(text: &str) -> Vec<Result<ReplyChunk, AIError>> {
    text.split_inclusive(char::is_whitespace)
        .map(|piece| Ok(ReplyChunk::content(piece)))
        .collect()
}

#[async_trait]
impl ReplyGenerator for MockReplyGenerator {
    async fn generate_reply(&self, request: ReplyRequest) -> Result<ReplyStream, AIError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        let delay = self.delay;
        let paced = move |chunks: Vec<Result<ReplyChunk, AIError>>| {
            stream::iter(chunks).then(move |chunk| async move {
                if !delay.is_zero() {
                    sleep(delay).await;
                }
                chunk
            })
        };

        let stream: ReplyStream = match self.next_reply() {
            MockReply::Complete(text) => {
                let mut chunks = fragments(&text);
                chunks.push(Ok(ReplyChunk::finished(FinishReason::Stop)));
                Box::pin(paced(chunks))
            }
            MockReply::Truncated(text) => Box::pin(paced(fragments(&text))),
            MockReply::Hanging(text) => Box::pin(paced(fragments(&text)).chain(stream::pending())),
            MockReply::FailMidway { text, error } => {
                let mut chunks = fragments(&text);
                chunks.push(Err(error));
                Box::pin(paced(chunks))
            }
            MockReply::Error(error) => return Err(error),
        };
        Ok(stream)
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{ConversationId, ThreadIdentity};

    fn request() -> ReplyRequest {
        let conv = ConversationId::new("conv-1").unwrap();
        ReplyRequest::new("Bonjour", ThreadIdentity::derive(&conv))
    }

    async fn collect(stream: ReplyStream) -> Vec<Result<ReplyChunk, AIError>> {
        stream.collect().await
    }

    #[tokio::test]
    async fn streams_fragments_that_rebuild_the_script() {
        let text = "📝 Message proposé :\nBonjour,\n\nMon colis est arrivé abîmé.";
        let generator = MockReplyGenerator::new().with_reply(text);

        let chunks = collect(generator.generate_reply(request()).await.unwrap()).await;

        let (last, body) = chunks.split_last().unwrap();
        assert!(last.as_ref().unwrap().is_final());
        let rebuilt: String = body.iter().map(|c| c.as_ref().unwrap().delta.as_str()).collect();
        assert_eq!(rebuilt, text);
    }

    #[tokio::test]
    async fn truncated_reply_has_no_final_chunk() {
        let generator = MockReplyGenerator::new().with_script(MockReply::Truncated("a b".into()));

        let chunks = collect(generator.generate_reply(request()).await.unwrap()).await;

        assert!(chunks.iter().all(|c| !c.as_ref().unwrap().is_final()));
    }

    #[tokio::test]
    async fn replays_script_in_order_then_default() {
        let generator = MockReplyGenerator::new()
            .with_error(AIError::AuthenticationFailed)
            .with_reply("ok");

        assert!(matches!(
            generator.generate_reply(request()).await,
            Err(AIError::AuthenticationFailed)
        ));
        let second = collect(generator.generate_reply(request()).await.unwrap()).await;
        assert_eq!(second[0].as_ref().unwrap().delta, "ok");
        let third = collect(generator.generate_reply(request()).await.unwrap()).await;
        assert_eq!(third[0].as_ref().unwrap().delta, DEFAULT_MOCK_REPLY.split_inclusive(' ').next().unwrap());
        assert_eq!(generator.call_count(), 3);
    }

    #[tokio::test]
    async fn records_requests() {
        let generator = MockReplyGenerator::new();
        let _ = generator
            .generate_reply(request().with_seller_hints_disabled(true))
            .await
            .unwrap();

        assert!(generator.calls()[0].disable_seller_hints);
    }
}
