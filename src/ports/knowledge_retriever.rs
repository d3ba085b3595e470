//! Knowledge retrieval port.
//!
//! Returns knowledge-base sections ordered by relevance to a query. The
//! ranking quality is the adapter's concern; callers only rely on order.

use async_trait::async_trait;

use crate::domain::drafting::KnowledgeSection;

/// Port for knowledge-base retrieval.
#[async_trait]
pub trait KnowledgeRetriever: Send + Sync {
    /// Returns at most `top_k` sections, best match first.
    async fn retrieve_candidates(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<KnowledgeSection>, RetrievalError>;
}

/// Knowledge retrieval errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RetrievalError {
    #[error("knowledge source unavailable: {0}")]
    Unavailable(String),

    #[error("invalid knowledge data: {0}")]
    InvalidData(String),
}
