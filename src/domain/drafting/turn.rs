//! Draft turns - the ephemeral exchange inside one drafting round.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, TurnId};

/// Appended to a partially streamed reply that was cancelled.
pub const CANCELLED_MARKER: &str = "[réponse interrompue]";

/// Author of a draft turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    Customer,
    Assistant,
}

/// Lifecycle of a turn's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    /// Fragments are still arriving.
    Streaming,
    Complete,
    /// Terminal error content, never a proposal source.
    Failed,
    /// Terminal cancellation content, never a proposal source.
    Cancelled,
}

/// One message in the current drafting round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftTurn {
    pub id: TurnId,
    pub role: TurnRole,
    pub content: String,
    pub status: TurnStatus,
    pub timestamp: Timestamp,
}

impl DraftTurn {
    /// A complete customer turn.
    pub fn customer(content: impl Into<String>) -> Self {
        Self::with(TurnRole::Customer, content.into(), TurnStatus::Complete)
    }

    /// An empty assistant turn waiting for fragments.
    pub fn streaming_assistant() -> Self {
        Self::with(TurnRole::Assistant, String::new(), TurnStatus::Streaming)
    }

    /// A terminal assistant error turn.
    pub fn error(message: impl Into<String>) -> Self {
        Self::with(TurnRole::Assistant, message.into(), TurnStatus::Failed)
    }

    fn with(role: TurnRole, content: String, status: TurnStatus) -> Self {
        Self {
            id: TurnId::new(),
            role,
            content,
            status,
            timestamp: Timestamp::now(),
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.status == TurnStatus::Streaming
    }

    /// True for a finished assistant reply that may carry a proposal.
    pub fn is_completed_reply(&self) -> bool {
        self.role == TurnRole::Assistant && self.status == TurnStatus::Complete
    }

    /// Appends one streamed fragment. Ignored once the turn is terminal.
    pub fn push_fragment(&mut self, fragment: &str) {
        if self.is_streaming() {
            self.content.push_str(fragment);
        }
    }

    pub(crate) fn finish(&mut self) {
        self.status = TurnStatus::Complete;
    }

    /// Replaces the content with a terminal error message.
    pub(crate) fn fail(&mut self, message: &str) {
        self.content = message.to_string();
        self.status = TurnStatus::Failed;
    }

    /// Keeps partial content and appends the cancellation marker.
    pub(crate) fn cancel(&mut self) {
        if self.content.trim().is_empty() {
            self.content = CANCELLED_MARKER.to_string();
        } else {
            self.content = format!("{}\n\n{}", self.content.trim_end(), CANCELLED_MARKER);
        }
        self.status = TurnStatus::Cancelled;
    }
}
