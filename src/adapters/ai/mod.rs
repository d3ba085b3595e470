//! Reply generator adapters.
//!
//! - `MockReplyGenerator` - Scripted replies for tests and local runs
//! - `ChatCompletionsReplyGenerator` - OpenAI-compatible streaming chat API

mod chat_completions;
mod mock_reply_generator;

pub use chat_completions::{
    ChatCompletionsConfig, ChatCompletionsReplyGenerator, DRAFTING_INSTRUCTIONS,
};
pub use mock_reply_generator::{MockReply, MockReplyGenerator, DEFAULT_MOCK_REPLY};
