//! Drafting pipeline configuration

use serde::Deserialize;
use std::path::PathBuf;

use crate::application::DEFAULT_RETRIEVAL_TOP_K;
use crate::domain::drafting::{DEFAULT_EMPTY_REQUIREMENTS, DEFAULT_MAX_REQUIREMENTS};

use super::error::ValidationError;

/// Drafting pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DraftingConfig {
    /// Knowledge sections requested per submit
    #[serde(default = "default_top_k")]
    pub retrieval_top_k: usize,

    /// Requirements kept in the seller hints
    #[serde(default = "default_max_requirements")]
    pub max_requirements: usize,

    /// YAML knowledge file; the built-in set is used when absent
    pub knowledge_path: Option<PathBuf>,

    /// Sentinel used when no requirement was found
    #[serde(default = "default_empty_requirements")]
    pub empty_requirements_text: String,

    /// Thread turns replayed to the generator
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

impl DraftingConfig {
    /// Validate drafting configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=20).contains(&self.retrieval_top_k) {
            return Err(ValidationError::InvalidRetrievalTopK);
        }
        if self.max_requirements == 0 {
            return Err(ValidationError::InvalidMaxRequirements);
        }
        if let Some(path) = &self.knowledge_path {
            if !path.is_file() {
                return Err(ValidationError::KnowledgeFileNotFound(
                    path.display().to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl Default for DraftingConfig {
    fn default() -> Self {
        Self {
            retrieval_top_k: default_top_k(),
            max_requirements: default_max_requirements(),
            knowledge_path: None,
            empty_requirements_text: default_empty_requirements(),
            history_window: default_history_window(),
        }
    }
}

fn default_top_k() -> usize {
    DEFAULT_RETRIEVAL_TOP_K
}

fn default_max_requirements() -> usize {
    DEFAULT_MAX_REQUIREMENTS
}

fn default_empty_requirements() -> String {
    DEFAULT_EMPTY_REQUIREMENTS.to_string()
}

fn default_history_window() -> usize {
    20
}
