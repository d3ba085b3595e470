//! Problem typology classification.
//!
//! A customer's free-text problem description is mapped to one
//! [`ProblemTypology`] by an ordered decision table of substring rules.
//! Order matters: a description mentioning both a wrong model and damage is
//! a wrong-item problem, so the wrong-item rule is evaluated first.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::normalizer::{contains_any, normalize};

/// Closed classification of a customer's stated problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProblemTypology {
    #[default]
    Unknown,
    WrongItem,
    Damaged,
    Malfunction,
    MissingParts,
    Delivery,
    Tracking,
    Quality,
    Warranty,
    Size,
    Refund,
}

impl ProblemTypology {
    /// Short label used to steer knowledge retrieval queries.
    pub fn query_label(&self) -> Option<&'static str> {
        match self {
            ProblemTypology::Unknown => None,
            ProblemTypology::WrongItem => Some("wrong item received"),
            ProblemTypology::Damaged => Some("damaged product"),
            ProblemTypology::Malfunction => Some("product malfunction"),
            ProblemTypology::MissingParts => Some("missing parts"),
            ProblemTypology::Delivery => Some("delivery problem"),
            ProblemTypology::Tracking => Some("tracking problem"),
            ProblemTypology::Quality => Some("quality issue"),
            ProblemTypology::Warranty => Some("warranty claim"),
            ProblemTypology::Size => Some("size issue"),
            ProblemTypology::Refund => Some("refund request"),
        }
    }

    /// Returns true if no rule matched.
    pub fn is_unknown(&self) -> bool {
        matches!(self, ProblemTypology::Unknown)
    }
}

/// One row of the decision table: any of `keywords` yields `typology`.
#[derive(Debug, Clone)]
pub struct TypologyRule {
    pub typology: ProblemTypology,
    pub keywords: Vec<&'static str>,
}

impl TypologyRule {
    fn new(typology: ProblemTypology, keywords: &[&'static str]) -> Self {
        Self {
            typology,
            keywords: keywords.to_vec(),
        }
    }

    /// Substring test on an already-normalized description.
    pub fn matches(&self, normalized: &str) -> bool {
        contains_any(normalized, &self.keywords)
    }
}

/// Default rule table in priority order. Keywords are pre-normalized.
static DEFAULT_RULES: Lazy<Vec<TypologyRule>> = Lazy::new(|| {
    use ProblemTypology::*;
    vec![
        TypologyRule::new(
            WrongItem,
            &[
                "mauvais",
                "pas le bon",
                "pas la bonne",
                "a la place",
                "erreur de modele",
                "produit different",
                "recu le model",
            ],
        ),
        TypologyRule::new(Damaged, &["casse", "endommag", "degat", "fissur", "abime", "brise"]),
        TypologyRule::new(
            Malfunction,
            &["ne s allume", "ne fonctionne", "ne marche", "panne", "defectu"],
        ),
        TypologyRule::new(MissingParts, &["manqu", "incomplet", "accessoire", "piece"]),
        TypologyRule::new(Tracking, &["suivi", "tracking"]),
        TypologyRule::new(Delivery, &["pas recu", "non recu", "livraison", "colis", "perdu"]),
        TypologyRule::new(Warranty, &["garantie"]),
        TypologyRule::new(Size, &["taille", "trop petit", "trop grand"]),
        TypologyRule::new(Refund, &["rembours"]),
        TypologyRule::new(Quality, &["qualite", "non conforme", "description"]),
    ]
});

/// Maps problem descriptions to a [`ProblemTypology`].
///
/// Rules are evaluated in order and the first match wins; no match yields
/// [`ProblemTypology::Unknown`], which is a valid result rather than an error.
#[derive(Debug, Clone)]
pub struct TypologyClassifier {
    rules: Vec<TypologyRule>,
}

impl Default for TypologyClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl TypologyClassifier {
    /// Creates a classifier with the default priority table.
    pub fn new() -> Self {
        Self {
            rules: DEFAULT_RULES.clone(),
        }
    }

    /// Creates a classifier with a custom ordered rule table.
    pub fn with_rules(rules: Vec<TypologyRule>) -> Self {
        Self { rules }
    }

    /// The rule table in evaluation order.
    pub fn rules(&self) -> &[TypologyRule] {
        &self.rules
    }

    /// Classifies a raw problem description.
    pub fn classify(&self, problem_description: &str) -> ProblemTypology {
        let normalized = normalize(problem_description);
        if normalized.is_empty() {
            return ProblemTypology::Unknown;
        }

        self.rules
            .iter()
            .find(|rule| rule.matches(&normalized))
            .map(|rule| rule.typology)
            .unwrap_or(ProblemTypology::Unknown)
    }
}
