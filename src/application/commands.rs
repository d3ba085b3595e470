//! Commands accepted and results returned by the drafting session manager.

use crate::domain::conversation::MessageSender;
use crate::domain::drafting::{DraftSession, DraftSessionState, DraftTurn, ProposedMessage};
use crate::domain::foundation::{ConversationId, MessageId, ThreadIdentity, Timestamp};

/// Submit a customer message to the drafting assistant.
#[derive(Debug, Clone)]
pub struct SubmitCommand {
    pub conversation_id: ConversationId,
    /// Thread the client believes is current; checked when present.
    pub thread_id: Option<String>,
    pub message: String,
    pub customer_name: Option<String>,
}

impl SubmitCommand {
    pub fn new(conversation_id: ConversationId, message: impl Into<String>) -> Self {
        Self {
            conversation_id,
            thread_id: None,
            message: message.into(),
            customer_name: None,
        }
    }

    pub fn with_thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn with_customer_name(mut self, name: impl Into<String>) -> Self {
        self.customer_name = Some(name.into());
        self
    }
}

/// Save a message directly into a conversation, bypassing drafting.
#[derive(Debug, Clone)]
pub struct SaveMessageCommand {
    pub conversation_id: ConversationId,
    pub from: MessageSender,
    pub content: String,
    pub customer_name: Option<String>,
}

/// Identifier and time of a persisted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedMessage {
    pub message_id: MessageId,
    pub timestamp: Timestamp,
}

/// Outcome of a successful approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalReceipt {
    pub message_id: MessageId,
    pub timestamp: Timestamp,
    pub content: String,
    /// Fresh thread for the next drafting round.
    pub thread_id: ThreadIdentity,
}

/// Outcome of clearing a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearOutcome {
    pub deleted_messages: u64,
    pub deleted_thread_records: u64,
    pub conversation_id: ConversationId,
    pub thread_id: ThreadIdentity,
}

/// Read model of a drafting session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub conversation_id: ConversationId,
    pub thread_id: ThreadIdentity,
    pub state: DraftSessionState,
    pub customer_name: Option<String>,
    pub turns: Vec<DraftTurn>,
    pub proposal: Option<ProposedMessage>,
    pub updated_at: Timestamp,
}

impl From<&DraftSession> for SessionSnapshot {
    fn from(session: &DraftSession) -> Self {
        Self {
            conversation_id: session.conversation_id().clone(),
            thread_id: session.thread_identity().clone(),
            state: session.state(),
            customer_name: session.customer_name().map(str::to_string),
            turns: session.turns().to_vec(),
            proposal: session.last_proposal().cloned(),
            updated_at: session.updated_at(),
        }
    }
}
