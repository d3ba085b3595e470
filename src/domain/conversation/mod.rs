//! Conversation domain module.
//!
//! The persistent side of the system: approved customer messages, seller
//! messages, and the history records of drafting threads.

mod message;
mod thread;

pub use message::{MessageSender, PersistedMessage};
pub use thread::ThreadRecord;
