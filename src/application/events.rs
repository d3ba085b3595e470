//! Streaming events emitted while a reply is drafted.
//!
//! One submit produces exactly one of these sequences:
//!
//! ```text
//! start, token*, end
//! start, token*, error
//! start, token*, cancelled
//! ```

use serde::Serialize;

use crate::domain::drafting::{DraftSessionState, ProposedMessage};
use crate::domain::foundation::TurnId;

/// Event for real-time reply updates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DraftEvent {
    /// The reply was accepted and generation is starting.
    #[serde(rename_all = "camelCase")]
    Start {
        conversation_id: String,
        thread_id: String,
        turn_id: TurnId,
    },
    /// One reply fragment, in arrival order.
    Token { delta: String },
    /// Reply complete and parsed.
    #[serde(rename_all = "camelCase")]
    End {
        proposal: ProposedMessage,
        state: DraftSessionState,
        thread_id: String,
    },
    /// Generation failed; the session is back in `Drafting`.
    Error { message: String },
    /// Generation was cancelled; the session is back in `Drafting`.
    Cancelled,
}

impl DraftEvent {
    /// Event name used on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            DraftEvent::Start { .. } => "start",
            DraftEvent::Token { .. } => "token",
            DraftEvent::End { .. } => "end",
            DraftEvent::Error { .. } => "error",
            DraftEvent::Cancelled => "cancelled",
        }
    }

    /// True for the last event of a sequence.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DraftEvent::End { .. } | DraftEvent::Error { .. } | DraftEvent::Cancelled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag_and_camel_case_fields() {
        let event = DraftEvent::End {
            proposal: ProposedMessage::default(),
            state: DraftSessionState::Drafting,
            thread_id: "c-ai-1".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "end");
        assert_eq!(json["threadId"], "c-ai-1");
        assert_eq!(json["proposal"]["proposedMessage"], "");
    }

    #[test]
    fn terminal_events() {
        assert!(DraftEvent::Cancelled.is_terminal());
        assert!(!DraftEvent::Token { delta: "a".into() }.is_terminal());
        assert_eq!(DraftEvent::Cancelled.name(), "cancelled");
    }
}
