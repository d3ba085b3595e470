//! Drafting session lifecycle.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// State of a drafting session.
///
/// ```text
/// Idle ──submit──► Drafting ──reply with proposal──► ProposalPending
///                    ▲  │                               │   │
///                    │  └──────reply w/o proposal───────┘   │ approve
///                    │                                      ▼
///                    └───────────approval failed─────── Approving ──ok──► Idle
/// ```
///
/// `clear` returns any state to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DraftSessionState {
    /// No draft turns, nothing pending.
    #[default]
    Idle,
    /// Turns exchanged, no unresolved proposal.
    Drafting,
    /// The latest reply carries a non-empty proposed message.
    ProposalPending,
    /// Approval in flight.
    Approving,
}

impl DraftSessionState {
    /// True if a new customer message may be submitted.
    pub fn accepts_submit(&self) -> bool {
        matches!(
            self,
            DraftSessionState::Idle | DraftSessionState::Drafting | DraftSessionState::ProposalPending
        )
    }

    /// True if approve() may be called.
    pub fn accepts_approval(&self) -> bool {
        matches!(self, DraftSessionState::ProposalPending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DraftSessionState::Idle => "idle",
            DraftSessionState::Drafting => "drafting",
            DraftSessionState::ProposalPending => "proposal_pending",
            DraftSessionState::Approving => "approving",
        }
    }
}

impl std::fmt::Display for DraftSessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StateMachine for DraftSessionState {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use DraftSessionState::*;
        match self {
            Idle => vec![Idle, Drafting],
            Drafting => vec![Drafting, ProposalPending, Idle],
            ProposalPending => vec![Drafting, Approving, Idle],
            Approving => vec![Idle, Drafting],
        }
    }
}
