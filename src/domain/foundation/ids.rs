//! Strongly-typed identifier value objects.
//!
//! Two identities matter to the drafting flow:
//!
//! - [`ConversationId`] names the persistent customer-seller conversation.
//! - [`ThreadIdentity`] names one ephemeral drafting round. It can only be
//!   derived from a conversation id, so the conversation id is always a
//!   literal prefix of the thread identity (`{conversation}-ai-{suffix}`).
//!   Bulk cleanup of every drafting round of a conversation relies on it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Separator between the conversation prefix and the opaque thread suffix.
pub const THREAD_SEPARATOR: &str = "-ai-";

/// Identifier of a persistent customer-seller conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConversationId(String);

impl ConversationId {
    /// Allocates a brand-new random conversation id.
    pub fn generate() -> Self {
        Self(format!("conv-{}", Uuid::new_v4().simple()))
    }

    /// Wraps a caller-supplied id.
    ///
    /// Rejects empty values, whitespace and the thread separator; the latter
    /// keeps one conversation's threads out of another's prefix match.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::empty_field("conversation_id"));
        }
        if id.chars().any(char::is_whitespace) {
            return Err(ValidationError::invalid_format(
                "conversation_id",
                "must not contain whitespace",
            ));
        }
        if id.contains(THREAD_SEPARATOR) {
            return Err(ValidationError::invalid_format(
                "conversation_id",
                "must not contain the thread separator",
            ));
        }
        Ok(Self(id))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConversationId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ConversationId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ConversationId> for String {
    fn from(id: ConversationId) -> Self {
        id.0
    }
}

/// Identity of one drafting round, always prefixed by its conversation id.
///
/// There is deliberately no constructor from a bare string that skips the
/// conversation: use [`ThreadIdentity::derive`] to open a round and
/// [`ThreadIdentity::parse`] to validate an identity received from a client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct ThreadIdentity {
    conversation_id: ConversationId,
    suffix: String,
}

impl ThreadIdentity {
    /// Derives a fresh thread identity for the given conversation.
    pub fn derive(conversation_id: &ConversationId) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self {
            conversation_id: conversation_id.clone(),
            suffix: suffix[..12].to_string(),
        }
    }

    /// Parses an identity previously produced by [`ThreadIdentity::derive`].
    ///
    /// The conversation part is everything before the last separator.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let (prefix, suffix) = raw.rsplit_once(THREAD_SEPARATOR).ok_or_else(|| {
            ValidationError::invalid_format("thread_id", "missing conversation prefix")
        })?;
        if suffix.is_empty() {
            return Err(ValidationError::empty_field("thread_id suffix"));
        }
        Ok(Self {
            conversation_id: ConversationId::new(prefix)?,
            suffix: suffix.to_string(),
        })
    }

    /// The conversation this drafting round belongs to.
    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    /// Returns a new identity for the same conversation.
    pub fn rotate(&self) -> Self {
        Self::derive(&self.conversation_id)
    }

    /// True if this is the thread `prefix` or a thread of the conversation
    /// `prefix`.
    ///
    /// A bare `starts_with` would also match `shop2-ai-…` for `shop`.
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        self.conversation_id.as_str() == prefix || self.to_string() == prefix
    }

    /// True if this identity was derived from `conversation_id`.
    pub fn belongs_to(&self, conversation_id: &ConversationId) -> bool {
        &self.conversation_id == conversation_id
    }
}

impl fmt::Display for ThreadIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.conversation_id, THREAD_SEPARATOR, self.suffix)
    }
}

impl From<ThreadIdentity> for String {
    fn from(id: ThreadIdentity) -> Self {
        id.to_string()
    }
}

/// Unique identifier for a persisted conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Creates a new random MessageId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a MessageId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MessageId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Unique identifier for a turn inside a drafting session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnId(Uuid);

impl TurnId {
    /// Creates a new random TurnId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
