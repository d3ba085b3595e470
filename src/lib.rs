//! Seller Draft - AI-assisted drafting of customer-to-seller messages.
//!
//! A customer describes a problem with an order; the assistant classifies
//! it, gathers what the seller will likely ask for, and streams back a
//! proposed message. Once the customer approves, exactly that message is
//! persisted to the conversation and the drafting thread starts afresh.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
