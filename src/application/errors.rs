//! Application-facing drafting errors.

use thiserror::Error;

use crate::domain::foundation::{ConversationId, DomainError, ErrorCode};
use crate::ports::{AIError, StorageError};

/// Errors returned by drafting operations.
#[derive(Debug, Clone, Error)]
pub enum DraftingError {
    /// Operation not allowed in the session's current state.
    #[error("Cannot {operation} while session is {state}")]
    InvalidState { operation: String, state: String },

    #[error("Drafting session not found: {0}")]
    SessionNotFound(ConversationId),

    /// A reply is already streaming or an approval is in flight.
    #[error("Drafting session {0} is busy")]
    SessionBusy(ConversationId),

    /// The client's thread identity is not the session's current one.
    #[error("Thread {thread_id} is not the current drafting thread")]
    ThreadMismatch { thread_id: String },

    #[error("Message cannot be empty")]
    EmptyMessage,

    /// Approval requested with nothing extractable to send.
    #[error("No proposed message to approve")]
    NoProposal,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Reply generation failed: {0}")]
    Generation(#[from] AIError),

    #[error("Storage failure: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DraftingError {
    /// True if the caller can retry after fixing their input or waiting.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, DraftingError::Storage(_) | DraftingError::Internal(_))
    }
}

impl From<DomainError> for DraftingError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::NoProposal => DraftingError::NoProposal,
            ErrorCode::ValidationFailed => match err.details.get("field").map(String::as_str) {
                Some("message") | Some("content") => DraftingError::EmptyMessage,
                _ => DraftingError::Validation(err.message),
            },
            ErrorCode::InvalidStateTransition => match (
                err.details.get("operation"),
                err.details.get("state"),
            ) {
                (Some(operation), Some(state)) => DraftingError::InvalidState {
                    operation: operation.clone(),
                    state: state.clone(),
                },
                _ => DraftingError::Internal(err.message),
            },
        }
    }
}

impl From<crate::domain::foundation::ValidationError> for DraftingError {
    fn from(err: crate::domain::foundation::ValidationError) -> Self {
        DraftingError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_proposal_code_maps_to_no_proposal() {
        let err: DraftingError = DomainError::new(ErrorCode::NoProposal, "nothing").into();
        assert!(matches!(err, DraftingError::NoProposal));
    }

    #[test]
    fn empty_message_validation_maps_to_empty_message() {
        let err: DraftingError = DomainError::validation("message", "empty").into();
        assert!(matches!(err, DraftingError::EmptyMessage));
    }

    #[test]
    fn state_details_are_carried() {
        let err: DraftingError = DomainError::new(ErrorCode::InvalidStateTransition, "nope")
            .with_detail("operation", "approve")
            .with_detail("state", "idle")
            .into();
        assert_eq!(err.to_string(), "Cannot approve while session is idle");
    }

    #[test]
    fn storage_failures_are_not_recoverable() {
        assert!(!DraftingError::Storage(StorageError::database("down")).is_recoverable());
        assert!(DraftingError::NoProposal.is_recoverable());
    }
}
