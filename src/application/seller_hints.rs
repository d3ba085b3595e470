//! Seller hints: classify the problem, retrieve knowledge, rank requirements.

use std::sync::Arc;

use crate::domain::drafting::{ProblemTypology, RequirementRanker, TypologyClassifier};
use crate::ports::KnowledgeRetriever;

/// Default number of knowledge sections requested per submit.
pub const DEFAULT_RETRIEVAL_TOP_K: usize = 6;

/// Requirement hints composed for one customer message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellerHints {
    pub typology: ProblemTypology,
    /// Bullet list, or the ranker's "nothing found" sentinel.
    pub requirements: String,
    /// Number of sections retrieval returned.
    pub retrieved: usize,
}

/// Composes seller-requirement hints for a customer message.
pub struct SellerHintsService {
    classifier: TypologyClassifier,
    ranker: RequirementRanker,
    retriever: Arc<dyn KnowledgeRetriever>,
    top_k: usize,
}

impl SellerHintsService {
    pub fn new(retriever: Arc<dyn KnowledgeRetriever>) -> Self {
        Self {
            classifier: TypologyClassifier::new(),
            ranker: RequirementRanker::new(),
            retriever,
            top_k: DEFAULT_RETRIEVAL_TOP_K,
        }
    }

    pub fn with_ranker(mut self, ranker: RequirementRanker) -> Self {
        self.ranker = ranker;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Retrieval query steering the knowledge search toward the typology.
    pub fn query_for(typology: ProblemTypology, message: &str) -> String {
        match typology.query_label() {
            Some(label) => format!("{} {}", label, message.trim()),
            None => message.trim().to_string(),
        }
    }

    /// Composes hints, or `None` when disabled for this turn or when
    /// retrieval failed.
    pub async fn compose(&self, message: &str, disable_seller_hints: bool) -> Option<SellerHints> {
        if disable_seller_hints {
            tracing::debug!("seller hints disabled for follow-up message");
            return None;
        }

        let typology = self.classifier.classify(message);
        let query = Self::query_for(typology, message);

        let sections = match self.retriever.retrieve_candidates(&query, self.top_k).await {
            Ok(sections) => sections,
            Err(e) => {
                tracing::warn!(error = %e, typology = ?typology, "knowledge retrieval failed, continuing without hints");
                return None;
            }
        };

        let requirements = self.ranker.rank(&sections, typology);
        tracing::debug!(
            typology = ?typology,
            retrieved = sections.len(),
            "seller hints composed"
        );

        Some(SellerHints {
            typology,
            requirements,
            retrieved: sections.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::drafting::KnowledgeSection;
    use crate::ports::RetrievalError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingRetriever {
        sections: Result<Vec<KnowledgeSection>, RetrievalError>,
        queries: Mutex<Vec<(String, usize)>>,
    }

    impl RecordingRetriever {
        fn returning(sections: Vec<KnowledgeSection>) -> Arc<Self> {
            Arc::new(Self {
                sections: Ok(sections),
                queries: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                sections: Err(RetrievalError::Unavailable("offline".into())),
                queries: Mutex::new(Vec::new()),
            })
        }

        fn queries(&self) -> Vec<(String, usize)> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl KnowledgeRetriever for RecordingRetriever {
        async fn retrieve_candidates(
            &self,
            query: &str,
            top_k: usize,
        ) -> Result<Vec<KnowledgeSection>, RetrievalError> {
            self.queries.lock().unwrap().push((query.to_string(), top_k));
            self.sections.clone()
        }
    }

    fn damaged_section() -> KnowledgeSection {
        KnowledgeSection::new(
            "kb-1",
            "damaged-product",
            "Produit endommagé",
            "- Photo du colis\n- Photo du produit",
        )
    }

    #[tokio::test]
    async fn classifies_queries_and_ranks() {
        let retriever = RecordingRetriever::returning(vec![damaged_section()]);
        let service = SellerHintsService::new(retriever.clone()).with_top_k(4);

        let hints = service.compose("Mon écran est cassé", false).await.unwrap();

        assert_eq!(hints.typology, ProblemTypology::Damaged);
        assert_eq!(hints.requirements, "- Photo du colis\n- Photo du produit");
        assert_eq!(hints.retrieved, 1);
        assert_eq!(
            retriever.queries(),
            vec![("damaged product Mon écran est cassé".to_string(), 4)]
        );
    }

    #[tokio::test]
    async fn disabled_flag_skips_retrieval() {
        let retriever = RecordingRetriever::returning(vec![damaged_section()]);
        let service = SellerHintsService::new(retriever.clone());

        assert!(service.compose("Mon écran est cassé", true).await.is_none());
        assert!(retriever.queries().is_empty());
    }

    #[tokio::test]
    async fn retrieval_failure_degrades_to_no_hints() {
        let service = SellerHintsService::new(RecordingRetriever::failing());
        assert!(service.compose("Colis perdu", false).await.is_none());
    }

    #[tokio::test]
    async fn empty_retrieval_yields_sentinel() {
        let service = SellerHintsService::new(RecordingRetriever::returning(vec![]))
            .with_ranker(RequirementRanker::new().with_empty_text("rien"));

        let hints = service.compose("Bonjour", false).await.unwrap();

        assert_eq!(hints.typology, ProblemTypology::Unknown);
        assert_eq!(hints.requirements, "rien");
    }

    #[test]
    fn unknown_typology_queries_with_bare_message() {
        assert_eq!(
            SellerHintsService::query_for(ProblemTypology::Unknown, " Bonjour "),
            "Bonjour"
        );
    }
}
