//! Application layer - orchestration of the drafting workflow.
//!
//! The domain stays pure; this layer coordinates it with the ports:
//! seller hints are composed from the knowledge retriever, replies are
//! streamed from the reply generator, and approved messages land in the
//! conversation store.

pub mod commands;
pub mod draft_session_manager;
pub mod errors;
pub mod events;
pub mod seller_hints;

pub use commands::{
    ApprovalReceipt, ClearOutcome, SaveMessageCommand, SavedMessage, SessionSnapshot,
    SubmitCommand,
};
pub use draft_session_manager::{
    DraftSessionManager, EVENT_CHANNEL_CAPACITY, GENERATION_FAILED_NOTICE, SEND_FAILED_NOTICE,
};
pub use errors::DraftingError;
pub use events::DraftEvent;
pub use seller_hints::{SellerHints, SellerHintsService, DEFAULT_RETRIEVAL_TOP_K};
