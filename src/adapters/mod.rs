//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - Reply generators (OpenAI-compatible streaming, scripted mock)
//! - `knowledge` - YAML-backed keyword knowledge retriever
//! - `storage` - In-memory conversation and thread stores
//! - `postgres` - PostgreSQL conversation and thread stores
//! - `http` - Axum REST and SSE surface

pub mod ai;
pub mod http;
pub mod knowledge;
pub mod postgres;
pub mod storage;
