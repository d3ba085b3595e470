//! Thread history records - completed drafting turns kept per thread identity.

use crate::domain::drafting::TurnRole;
use crate::domain::foundation::{ThreadIdentity, Timestamp};

/// One completed turn stored under a drafting thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadRecord {
    pub thread_id: ThreadIdentity,
    pub role: TurnRole,
    pub content: String,
    pub timestamp: Timestamp,
}

impl ThreadRecord {
    pub fn new(thread_id: ThreadIdentity, role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            thread_id,
            role,
            content: content.into(),
            timestamp: Timestamp::now(),
        }
    }
}
