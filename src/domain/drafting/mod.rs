//! Drafting domain module.
//!
//! The message-drafting pipeline: text normalization, problem typology
//! classification, seller-requirement ranking, proposal extraction from
//! assistant replies, and the drafting session state machine.

mod normalizer;
mod proposal;
mod requirements;
mod session;
mod session_state;
mod turn;
mod typology;

pub use normalizer::normalize;
pub use proposal::{
    ProposalExtractor, ProposedMessage, APPROVAL_MARKERS, NAME_PLACEHOLDERS, PROPOSAL_MARKERS,
    SELLER_HINTS_MARKERS,
};
pub use requirements::{
    hint_keywords, is_document_like, KnowledgeSection, RequirementCandidate, RequirementRanker,
    DEFAULT_EMPTY_REQUIREMENTS, DEFAULT_MAX_REQUIREMENTS,
};
pub use session::{DraftSession, NO_PROPOSAL_NOTICE};
pub use session_state::DraftSessionState;
pub use turn::{DraftTurn, TurnRole, TurnStatus, CANCELLED_MARKER};
pub use typology::{ProblemTypology, TypologyClassifier, TypologyRule};
