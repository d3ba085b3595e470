//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (identifiers, timestamps, errors, state machine)
//! - `drafting` - Message-drafting pipeline and the drafting session aggregate
//! - `conversation` - Persisted conversation messages and thread history records

pub mod conversation;
pub mod drafting;
pub mod foundation;
