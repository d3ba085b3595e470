//! DraftSession aggregate - one customer's drafting rounds on a conversation.
//!
//! The aggregate is synchronous and I/O free. The application layer drives it
//! around collaborator calls: `begin_*` before, `complete_*`/`fail_*` after.

use crate::domain::foundation::{
    ConversationId, DomainError, ErrorCode, StateMachine, ThreadIdentity, Timestamp,
};

use super::proposal::{ProposalExtractor, ProposedMessage};
use super::session_state::DraftSessionState;
use super::turn::DraftTurn;

/// Error turn shown when approval finds nothing to send.
pub const NO_PROPOSAL_NOTICE: &str =
    "Aucun message à envoyer n'a été trouvé. Demandez d'abord une proposition de message.";

/// Drafting session for one conversation.
///
/// Invariants:
/// - the thread identity is always derived from the conversation id
/// - `ProposalPending` implies the last completed reply had a proposal
/// - at most one assistant turn is streaming, and it is the last turn
#[derive(Debug, Clone)]
pub struct DraftSession {
    identity: ThreadIdentity,
    customer_name: Option<String>,
    state: DraftSessionState,
    turns: Vec<DraftTurn>,
    last_proposal: Option<ProposedMessage>,
    updated_at: Timestamp,
}

impl DraftSession {
    /// Opens an idle session with a fresh drafting thread.
    pub fn open(conversation_id: ConversationId, customer_name: Option<String>) -> Self {
        Self {
            identity: ThreadIdentity::derive(&conversation_id),
            customer_name: clean_name(customer_name),
            state: DraftSessionState::Idle,
            turns: Vec::new(),
            last_proposal: None,
            updated_at: Timestamp::now(),
        }
    }

    // ───────────────────────────────────────────────────────────────
    // Accessors
    // ───────────────────────────────────────────────────────────────

    pub fn conversation_id(&self) -> &ConversationId {
        self.identity.conversation_id()
    }

    pub fn thread_identity(&self) -> &ThreadIdentity {
        &self.identity
    }

    pub fn customer_name(&self) -> Option<&str> {
        self.customer_name.as_deref()
    }

    pub fn state(&self) -> DraftSessionState {
        self.state
    }

    pub fn turns(&self) -> &[DraftTurn] {
        &self.turns
    }

    pub fn last_proposal(&self) -> Option<&ProposedMessage> {
        self.last_proposal.as_ref()
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Remembers the customer's name; blank names keep the previous one.
    pub fn set_customer_name(&mut self, name: Option<String>) {
        if let Some(name) = clean_name(name) {
            self.customer_name = Some(name);
        }
    }

    /// Extractor configured with this session's customer name.
    pub fn extractor(&self, show_seller_hints: bool) -> ProposalExtractor {
        ProposalExtractor::new()
            .with_customer_name(self.customer_name())
            .with_seller_hints(show_seller_hints)
    }

    // ───────────────────────────────────────────────────────────────
    // Submit
    // ───────────────────────────────────────────────────────────────

    /// Records the customer's message and opens a streaming assistant turn.
    pub fn begin_submit(&mut self, text: &str) -> Result<(), DomainError> {
        if text.trim().is_empty() {
            return Err(DomainError::validation("message", "Message cannot be empty"));
        }
        if !self.state.accepts_submit() {
            return Err(self.invalid_state("submit"));
        }

        self.move_to(DraftSessionState::Drafting)?;
        self.last_proposal = None;
        self.turns.push(DraftTurn::customer(text.trim()));
        self.turns.push(DraftTurn::streaming_assistant());
        Ok(())
    }

    /// Appends one fragment to the streaming reply.
    pub fn append_fragment(&mut self, fragment: &str) -> Result<(), DomainError> {
        let turn = self.streaming_turn_mut()?;
        turn.push_fragment(fragment);
        Ok(())
    }

    /// Closes the streaming reply and parses it for a proposal.
    pub fn complete_stream(
        &mut self,
        extractor: &ProposalExtractor,
    ) -> Result<ProposedMessage, DomainError> {
        let turn = self.streaming_turn_mut()?;
        turn.finish();
        let proposal = extractor.extract(&turn.content);

        if proposal.has_proposal() {
            self.move_to(DraftSessionState::ProposalPending)?;
            self.last_proposal = Some(proposal.clone());
        } else {
            self.move_to(DraftSessionState::Drafting)?;
        }
        Ok(proposal)
    }

    /// Terminates the streaming reply with an error message.
    pub fn fail_stream(&mut self, message: &str) -> Result<(), DomainError> {
        self.streaming_turn_mut()?.fail(message);
        self.move_to(DraftSessionState::Drafting)
    }

    /// Terminates the streaming reply as cancelled, keeping partial text.
    pub fn cancel_stream(&mut self) -> Result<(), DomainError> {
        self.streaming_turn_mut()?.cancel();
        self.move_to(DraftSessionState::Drafting)
    }

    /// Text of the most recent successfully completed reply.
    pub fn last_reply(&self) -> Option<&DraftTurn> {
        self.turns.iter().rev().find(|t| t.is_completed_reply())
    }

    // ───────────────────────────────────────────────────────────────
    // Approval
    // ───────────────────────────────────────────────────────────────

    /// Resolves the message to send and enters `Approving`.
    ///
    /// Falls back to re-extracting the last reply. With nothing to send, an
    /// error turn is appended and the session stays in `ProposalPending`.
    pub fn begin_approval(&mut self) -> Result<String, DomainError> {
        if !self.state.accepts_approval() {
            return Err(self.invalid_state("approve"));
        }

        let resolved = self
            .last_proposal
            .as_ref()
            .filter(|p| p.has_proposal())
            .map(|p| p.proposed_message.clone())
            .or_else(|| {
                let extractor = self.extractor(true);
                self.last_reply()
                    .map(|turn| extractor.extract(&turn.content))
                    .filter(ProposedMessage::has_proposal)
                    .map(|p| p.proposed_message)
            });

        let Some(message) = resolved else {
            self.turns.push(DraftTurn::error(NO_PROPOSAL_NOTICE));
            self.updated_at = Timestamp::now();
            return Err(DomainError::new(
                ErrorCode::NoProposal,
                "No proposed message to approve",
            )
            .with_detail("conversation_id", self.conversation_id().to_string()));
        };

        self.move_to(DraftSessionState::Approving)?;
        Ok(message)
    }

    /// Finishes a persisted approval: turns cleared, thread rotated.
    ///
    /// Returns the identity of the thread that was just closed.
    pub fn complete_approval(&mut self) -> Result<ThreadIdentity, DomainError> {
        self.ensure_approving("complete approval")?;
        self.move_to(DraftSessionState::Idle)?;
        let next = self.identity.rotate();
        let closed = std::mem::replace(&mut self.identity, next);
        self.turns.clear();
        self.last_proposal = None;
        Ok(closed)
    }

    /// Returns to `Drafting` after a failed persistence, keeping the turns.
    pub fn fail_approval(&mut self, message: &str) -> Result<(), DomainError> {
        self.ensure_approving("fail approval")?;
        self.move_to(DraftSessionState::Drafting)?;
        self.turns.push(DraftTurn::error(message));
        Ok(())
    }

    // ───────────────────────────────────────────────────────────────
    // Reset
    // ───────────────────────────────────────────────────────────────

    /// Moves the session to a brand-new conversation, dropping all turns.
    pub fn reset(&mut self, conversation_id: ConversationId) {
        self.identity = ThreadIdentity::derive(&conversation_id);
        self.turns.clear();
        self.last_proposal = None;
        self.state = DraftSessionState::Idle;
        self.updated_at = Timestamp::now();
    }

    // ───────────────────────────────────────────────────────────────
    // Internals
    // ───────────────────────────────────────────────────────────────

    fn move_to(&mut self, target: DraftSessionState) -> Result<(), DomainError> {
        self.state = self
            .state
            .transition_to(target)
            .map_err(|e| DomainError::new(ErrorCode::InvalidStateTransition, e.to_string()))?;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    fn streaming_turn_mut(&mut self) -> Result<&mut DraftTurn, DomainError> {
        self.turns
            .last_mut()
            .filter(|t| t.is_streaming())
            .ok_or_else(|| {
                DomainError::new(ErrorCode::InvalidStateTransition, "No reply is streaming")
            })
    }

    fn ensure_approving(&self, operation: &str) -> Result<(), DomainError> {
        if self.state == DraftSessionState::Approving {
            Ok(())
        } else {
            Err(self.invalid_state(operation))
        }
    }

    fn invalid_state(&self, operation: &str) -> DomainError {
        DomainError::new(
            ErrorCode::InvalidStateTransition,
            format!("Cannot {} while session is {}", operation, self.state),
        )
        .with_detail("operation", operation)
        .with_detail("state", self.state.as_str())
    }
}

fn clean_name(name: Option<String>) -> Option<String> {
    name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

#[cfg(test)]
impl DraftSession {
    /// Puts the session in `state` without going through the transition table.
    pub(crate) fn force_state(&mut self, state: DraftSessionState) {
        self.state = state;
    }
}
