//! Keyword knowledge retriever.
//!
//! Loads knowledge sections from YAML and ranks them by how many normalized
//! query terms they contain. Matches in the section id or title weigh more
//! than matches in the content. Ties keep file order.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;

use crate::domain::drafting::{normalize, KnowledgeSection};
use crate::ports::{KnowledgeRetriever, RetrievalError};

/// Knowledge set compiled into the binary.
const BUILTIN_KNOWLEDGE: &str = include_str!("../../../knowledge/default.yaml");

/// Weight of a query term found in the section id or title.
const LABEL_WEIGHT: usize = 2;

/// Terms shorter than this are ignored.
const MIN_TERM_LEN: usize = 3;

const STOP_WORDS: &[&str] = &[
    "les", "des", "une", "est", "mon", "mes", "que", "qui", "pour", "dans", "avec", "pas", "sur",
    "the", "and", "was", "are", "not", "has", "have", "with",
];

struct IndexedSection {
    section: KnowledgeSection,
    label: HashSet<String>,
    body: HashSet<String>,
}

impl IndexedSection {
    fn new(section: KnowledgeSection) -> Self {
        let label = terms(&format!("{} {}", section.section_id, section.title));
        let body = terms(&section.content);
        Self {
            section,
            label,
            body,
        }
    }

    fn score(&self, query: &HashSet<String>) -> usize {
        query
            .iter()
            .map(|term| {
                if self.label.contains(term) {
                    LABEL_WEIGHT
                } else if self.body.contains(term) {
                    1
                } else {
                    0
                }
            })
            .sum()
    }
}

/// Distinct normalized terms of a text.
fn terms(text: &str) -> HashSet<String> {
    normalize(text)
        .split_whitespace()
        .filter(|t| t.chars().count() >= MIN_TERM_LEN && !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

/// YAML-backed implementation of the KnowledgeRetriever port.
pub struct KeywordKnowledgeRetriever {
    sections: Vec<IndexedSection>,
}

impl KeywordKnowledgeRetriever {
    pub fn new(sections: Vec<KnowledgeSection>) -> Self {
        Self {
            sections: sections.into_iter().map(IndexedSection::new).collect(),
        }
    }

    /// Retriever over the built-in knowledge set.
    pub fn builtin() -> Self {
        match parse_sections(BUILTIN_KNOWLEDGE) {
            Ok(sections) => Self::new(sections),
            Err(e) => {
                tracing::error!(error = %e, "built-in knowledge set is invalid, starting empty");
                Self::new(Vec::new())
            }
        }
    }

    /// Parses a YAML list of `{id, sectionId, title, content}`.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, RetrievalError> {
        parse_sections(yaml).map(Self::new)
    }

    /// Loads a YAML knowledge file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RetrievalError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            RetrievalError::Unavailable(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let retriever = Self::from_yaml_str(&yaml)?;
        tracing::info!(
            path = %path.display(),
            sections = retriever.len(),
            "knowledge file loaded"
        );
        Ok(retriever)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

fn parse_sections(yaml: &str) -> Result<Vec<KnowledgeSection>, RetrievalError> {
    let sections: Vec<KnowledgeSection> = serde_yaml::from_str(yaml)
        .map_err(|e| RetrievalError::InvalidData(format!("Failed to parse knowledge: {}", e)))?;

    let mut seen = HashSet::new();
    for section in &sections {
        if section.id.trim().is_empty() {
            return Err(RetrievalError::InvalidData("section with empty id".into()));
        }
        if !seen.insert(section.id.as_str()) {
            return Err(RetrievalError::InvalidData(format!(
                "duplicate section id: {}",
                section.id
            )));
        }
    }
    Ok(sections)
}

#[async_trait]
impl KnowledgeRetriever for KeywordKnowledgeRetriever {
    async fn retrieve_candidates(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<KnowledgeSection>, RetrievalError> {
        let query = terms(query);
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, &IndexedSection)> = self
            .sections
            .iter()
            .map(|s| (s.score(&query), s))
            .filter(|(score, _)| *score > 0)
            .collect();
        // Stable sort keeps file order among equal scores.
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(_, s)| s.section.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
- id: a
  sectionId: delivery
  title: Colis perdu
  content: "- Numéro de suivi"
- id: b
  sectionId: damaged-product
  title: Produit endommagé
  content: "- Photo du colis"
- id: c
  sectionId: other
  title: Divers
  content: "- Photo"
"#;

    #[test]
    fn builtin_set_loads() {
        let retriever = KeywordKnowledgeRetriever::builtin();
        assert!(retriever.len() >= 10);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let yaml = "- {id: a, sectionId: x, title: t, content: c}\n- {id: a, sectionId: y, title: t, content: c}";
        assert!(matches!(
            KeywordKnowledgeRetriever::from_yaml_str(yaml),
            Err(RetrievalError::InvalidData(_))
        ));
    }

    #[test]
    fn rejects_malformed_yaml() {
        assert!(KeywordKnowledgeRetriever::from_yaml_str("- id: [").is_err());
    }

    #[test]
    fn missing_file_is_unavailable() {
        assert!(matches!(
            KeywordKnowledgeRetriever::from_path("/nonexistent/knowledge.yaml"),
            Err(RetrievalError::Unavailable(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.yaml");
        std::fs::write(&path, YAML).unwrap();

        assert_eq!(KeywordKnowledgeRetriever::from_path(&path).unwrap().len(), 3);
    }

    #[tokio::test]
    async fn label_matches_rank_first() {
        let retriever = KeywordKnowledgeRetriever::from_yaml_str(YAML).unwrap();

        let found = retriever
            .retrieve_candidates("damaged product colis", 5)
            .await
            .unwrap();

        let ids: Vec<_> = found.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn respects_top_k_and_skips_non_matches() {
        let retriever = KeywordKnowledgeRetriever::from_yaml_str(YAML).unwrap();

        let found = retriever.retrieve_candidates("photo", 1).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "b");

        assert!(retriever.retrieve_candidates("xyzzy", 5).await.unwrap().is_empty());
        assert!(retriever.retrieve_candidates("", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn builtin_damaged_query_finds_damaged_section() {
        let retriever = KeywordKnowledgeRetriever::builtin();

        let found = retriever
            .retrieve_candidates("damaged product Mon écran est arrivé endommagé", 3)
            .await
            .unwrap();

        assert_eq!(found[0].section_id, "damaged-product");
    }
}
