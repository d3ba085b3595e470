//! Chat-completions reply generator for OpenAI-compatible APIs.
//!
//! Builds the prompt from the drafting instructions, the per-turn context,
//! the recent history of the drafting thread and the new customer message,
//! then streams the reply over SSE.
//!
//! # Configuration
//!
//! ```ignore
//! let config = ChatCompletionsConfig::new(api_key)
//!     .with_model("gpt-4o-mini")
//!     .with_history_window(20);
//!
//! let generator = ChatCompletionsReplyGenerator::new(config, thread_store)?;
//! ```
//!
//! # Streaming
//!
//! SSE lines may be split across network chunks, so bytes are buffered until
//! a full line is available. A reply is final only when a choice carries a
//! `finish_reason`; `[DONE]` alone yields nothing.

use async_trait::async_trait;
use futures::future;
use futures::stream::{self, StreamExt};
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::drafting::TurnRole;
use crate::ports::{
    AIError, FinishReason, ProviderInfo, ReplyChunk, ReplyGenerator, ReplyRequest, ReplyStream,
    ThreadStore,
};

/// Drafting instructions sent as the first system message.
pub const DRAFTING_INSTRUCTIONS: &str = "\
Vous aidez un client à rédiger un message destiné au vendeur d'une place de marché. \
Posez des questions courtes si des informations manquent. \
Quand vous proposez un message, écrivez une ligne commençant par \
« 📝 Message proposé au vendeur : » suivie du message complet. \
Vous pouvez ensuite ajouter « 💡 Le vendeur pourrait aussi demander : » avec une courte liste, \
puis terminez par « Cliquez sur le bouton Approuver pour envoyer ce message. » \
Signez le message avec [Votre nom] si le nom du client est inconnu.";

const DEFAULT_RETRY_AFTER_SECS: u32 = 30;

/// Configuration for the chat-completions generator.
#[derive(Debug, Clone)]
pub struct ChatCompletionsConfig {
    api_key: Secret<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    /// Retries when opening the stream fails transiently.
    pub max_retries: u32,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Thread turns replayed before the new message.
    pub history_window: usize,
}

impl ChatCompletionsConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(120),
            max_retries: 3,
            temperature: 0.3,
            max_tokens: 1200,
            history_window: 20,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// ReplyGenerator backed by a `/chat/completions` endpoint.
pub struct ChatCompletionsReplyGenerator {
    config: ChatCompletionsConfig,
    client: Client,
    threads: Arc<dyn ThreadStore>,
}

impl ChatCompletionsReplyGenerator {
    pub fn new(config: ChatCompletionsConfig, threads: Arc<dyn ThreadStore>) -> Result<Self, AIError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AIError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            threads,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    /// Prompt messages: instructions, context, thread history, new message.
    async fn build_messages(&self, request: &ReplyRequest) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::new("system", DRAFTING_INSTRUCTIONS)];

        if let Some(name) = request.customer_name.as_deref() {
            messages.push(ChatMessage::new(
                "system",
                format!("Le client s'appelle {}.", name),
            ));
        }
        if let Some(context) = request.conversation_context.as_deref() {
            messages.push(ChatMessage::new("system", context));
        }

        match self.threads.list_thread_history(&request.thread_id).await {
            Ok(history) => {
                let skip = history.len().saturating_sub(self.config.history_window);
                for record in history.into_iter().skip(skip) {
                    let role = match record.role {
                        TurnRole::Customer => "user",
                        TurnRole::Assistant => "assistant",
                    };
                    messages.push(ChatMessage::new(role, record.content));
                }
            }
            Err(e) => {
                tracing::warn!(
                    thread_id = %request.thread_id,
                    error = %e,
                    "could not load thread history, replying without it"
                );
            }
        }

        messages.push(ChatMessage::new("user", request.message.as_str()));
        messages
    }

    async fn open_stream(&self, body: &ChatRequest) -> Result<Response, AIError> {
        let response = self
            .client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AIError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    AIError::network(format!("Connection failed: {}", e))
                } else {
                    AIError::network(e.to_string())
                }
            })?;

        check_status(response).await
    }
}

/// Maps non-success statuses to errors.
async fn check_status(response: Response) -> Result<Response, AIError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(status_error(status.as_u16(), &body))
}

fn status_error(status: u16, body: &str) -> AIError {
    match status {
        401 | 403 => AIError::AuthenticationFailed,
        429 => AIError::rate_limited(parse_retry_after(body)),
        400 => AIError::InvalidRequest(body.to_string()),
        500..=599 => AIError::unavailable(format!("Server error {}: {}", status, body)),
        _ => AIError::network(format!("Unexpected status {}: {}", status, body)),
    }
}

/// Seconds from a "try again in Ns" hint, or the default.
fn parse_retry_after(body: &str) -> u32 {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error")?.get("message")?.as_str().map(str::to_string))
        .and_then(|message| {
            let rest = &message[message.find("try again in ")? + "try again in ".len()..];
            let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().ok()
        })
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

#[async_trait]
impl ReplyGenerator for ChatCompletionsReplyGenerator {
    async fn generate_reply(&self, request: ReplyRequest) -> Result<ReplyStream, AIError> {
        let body = ChatRequest {
            model: self.config.model.clone(),
            messages: self.build_messages(&request).await,
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
            stream: true,
        };

        let mut attempt = 0;
        let response = loop {
            match self.open_stream(&body).await {
                Ok(response) => break response,
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    let delay = backoff_delay(attempt);
                    tracing::warn!(
                        error = %err,
                        attempt = attempt + 1,
                        delay_secs = delay.as_secs(),
                        "reply request failed, retrying"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        };

        let stream = response
            .bytes_stream()
            .scan(SseLineBuffer::default(), |buffer, chunk| {
                let parsed: Vec<Result<ReplyChunk, AIError>> = match chunk {
                    Ok(bytes) => buffer
                        .push(&bytes)
                        .iter()
                        .flat_map(|line| parse_sse_line(line))
                        .collect(),
                    Err(e) => vec![Err(AIError::network(format!("Stream error: {}", e)))],
                };
                future::ready(Some(parsed))
            })
            .flat_map(stream::iter);

        Ok(Box::pin(stream))
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("openai", self.config.model.as_str())
    }
}

/// Accumulates bytes until complete lines are available.
#[derive(Debug, Default)]
struct SseLineBuffer {
    pending: Vec<u8>,
}

impl SseLineBuffer {
    /// Adds bytes and drains every complete line.
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        let Some(last_newline) = self.pending.iter().rposition(|b| *b == b'\n') else {
            return Vec::new();
        };

        let complete: Vec<u8> = self.pending.drain(..=last_newline).collect();
        String::from_utf8_lossy(&complete)
            .lines()
            .map(|line| line.trim_end_matches('\r').to_string())
            .filter(|line| !line.is_empty())
            .collect()
    }
}

/// Parses one SSE line into zero, one or two chunks.
fn parse_sse_line(line: &str) -> Vec<Result<ReplyChunk, AIError>> {
    let Some(data) = line.strip_prefix("data:").map(str::trim_start) else {
        return Vec::new();
    };
    if data == "[DONE]" || data.trim().is_empty() {
        return Vec::new();
    }

    let chunk = match serde_json::from_str::<StreamResponseChunk>(data) {
        Ok(chunk) => chunk,
        Err(e) => {
            return vec![Err(AIError::parse(format!(
                "Failed to parse SSE chunk: {}",
                e
            )))]
        }
    };

    let mut results = Vec::new();
    if let Some(choice) = chunk.choices.into_iter().next() {
        if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
            results.push(Ok(ReplyChunk::content(content)));
        }
        if let Some(reason) = choice.finish_reason {
            let finish = match reason.as_str() {
                "length" => FinishReason::Length,
                "content_filter" => FinishReason::ContentFilter,
                _ => FinishReason::Stop,
            };
            results.push(Ok(ReplyChunk::finished(finish)));
        }
    }
    results
}

// ----- Chat completions API types -----

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

impl ChatMessage {
    fn new(role: &'static str, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StreamResponseChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

/// Largest backoff exponent; later retries keep waiting 64s.
const MAX_BACKOFF_EXPONENT: u32 = 6;

/// Exponential backoff: 1s, 2s, 4s, ... capped at 2^6 seconds.
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt.min(MAX_BACKOFF_EXPONENT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryThreadStore;
    use crate::domain::conversation::ThreadRecord;
    use crate::domain::foundation::{ConversationId, ThreadIdentity};

    fn generator(threads: Arc<InMemoryThreadStore>, window: usize) -> ChatCompletionsReplyGenerator {
        let config = ChatCompletionsConfig::new("test-key").with_history_window(window);
        ChatCompletionsReplyGenerator::new(config, threads).unwrap()
    }

    #[test]
    fn config_builder_works() {
        let config = ChatCompletionsConfig::new("test-key")
            .with_model("gpt-4o")
            .with_base_url("https://custom.api.com/v1/")
            .with_timeout(Duration::from_secs(30))
            .with_max_retries(5);

        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.base_url, "https://custom.api.com/v1");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.api_key(), "test-key");
    }

    mod sse {
        use super::*;

        #[test]
        fn content_chunk() {
            let line = r#"data: {"id":"c1","choices":[{"delta":{"content":"Bon"},"finish_reason":null}]}"#;
            let chunks = parse_sse_line(line);

            assert_eq!(chunks.len(), 1);
            assert_eq!(chunks[0].as_ref().unwrap().delta, "Bon");
        }

        #[test]
        fn final_chunk() {
            let line = r#"data: {"choices":[{"delta":{},"finish_reason":"length"}]}"#;
            let chunks = parse_sse_line(line);

            assert_eq!(
                chunks[0].as_ref().unwrap().finish_reason,
                Some(FinishReason::Length)
            );
        }

        #[test]
        fn done_marker_and_comments_yield_nothing() {
            assert!(parse_sse_line("data: [DONE]").is_empty());
            assert!(parse_sse_line(": keep-alive").is_empty());
        }

        #[test]
        fn malformed_json_is_a_parse_error() {
            let chunks = parse_sse_line("data: {not json");
            assert!(matches!(chunks[0], Err(AIError::Parse(_))));
        }

        #[test]
        fn buffer_joins_lines_split_across_chunks() {
            let mut buffer = SseLineBuffer::default();

            assert!(buffer.push(b"data: {\"a\":").is_empty());
            let lines = buffer.push(b"1}\n\ndata: [DO");
            assert_eq!(lines, vec!["data: {\"a\":1}".to_string()]);
            assert_eq!(buffer.push(b"NE]\r\n"), vec!["data: [DONE]".to_string()]);
        }

        #[test]
        fn buffer_keeps_multibyte_characters_intact() {
            let mut buffer = SseLineBuffer::default();
            let text = "data: é\n".as_bytes();

            assert!(buffer.push(&text[..7]).is_empty());
            assert_eq!(buffer.push(&text[7..]), vec!["data: é".to_string()]);
        }
    }

    mod backoff {
        use super::*;

        #[test]
        fn doubles_per_attempt() {
            assert_eq!(backoff_delay(0), Duration::from_secs(1));
            assert_eq!(backoff_delay(1), Duration::from_secs(2));
            assert_eq!(backoff_delay(3), Duration::from_secs(8));
        }

        #[test]
        fn is_capped_for_large_retry_counts() {
            assert_eq!(backoff_delay(6), Duration::from_secs(64));
            assert_eq!(backoff_delay(64), Duration::from_secs(64));
            assert_eq!(backoff_delay(u32::MAX), Duration::from_secs(64));
        }
    }

    mod status {
        use super::*;

        #[test]
        fn maps_statuses() {
            assert_eq!(status_error(401, ""), AIError::AuthenticationFailed);
            assert!(matches!(status_error(503, "busy"), AIError::Unavailable { .. }));
            assert!(matches!(status_error(400, "bad"), AIError::InvalidRequest(_)));
        }

        #[test]
        fn retry_after_from_message() {
            let body = r#"{"error":{"message":"Rate limit exceeded. Please try again in 12 seconds."}}"#;
            assert_eq!(status_error(429, body), AIError::rate_limited(12));
        }

        #[test]
        fn retry_after_default() {
            assert_eq!(parse_retry_after("oops"), DEFAULT_RETRY_AFTER_SECS);
        }
    }

    mod prompt {
        use super::*;

        #[tokio::test]
        async fn replays_recent_thread_history_before_the_message() {
            let threads = Arc::new(InMemoryThreadStore::new());
            let thread = ThreadIdentity::derive(&ConversationId::new("conv-1").unwrap());
            for (role, text) in [
                (TurnRole::Customer, "un"),
                (TurnRole::Assistant, "deux"),
                (TurnRole::Customer, "trois"),
            ] {
                threads
                    .append(&ThreadRecord::new(thread.clone(), role, text))
                    .await
                    .unwrap();
            }
            let generator = generator(threads, 2);

            let request = ReplyRequest::new("quatre", thread)
                .with_context("Indices")
                .with_customer_name(Some("Alice".into()));
            let messages = generator.build_messages(&request).await;

            let tail: Vec<_> = messages.iter().map(|m| (m.role, m.content.as_str())).collect();
            assert_eq!(
                tail[1..],
                [
                    ("system", "Le client s'appelle Alice."),
                    ("system", "Indices"),
                    ("assistant", "deux"),
                    ("user", "trois"),
                    ("user", "quatre"),
                ]
            );
            assert_eq!(messages[0].content, DRAFTING_INSTRUCTIONS);
        }
    }
}
