//! Seller-requirement ranking.
//!
//! Turns retrieved knowledge sections into a short, deduplicated list of
//! bullet lines describing what a seller is likely to ask for (photos,
//! invoice, serial number...). Sections whose id or title match the
//! problem typology are scanned first; within the result, proof-style
//! items are preferred over troubleshooting tips.

use serde::{Deserialize, Serialize};

use super::normalizer::{contains_any, normalize};
use super::typology::ProblemTypology;

/// Bullet marker expected at the start of a requirement line.
pub const BULLET: &str = "- ";

/// Default number of requirement lines returned.
pub const DEFAULT_MAX_REQUIREMENTS: usize = 3;

/// Default text returned when no requirement line could be extracted.
pub const DEFAULT_EMPTY_REQUIREMENTS: &str =
    "Aucune exigence spécifique trouvée pour ce type de problème.";

/// Keywords marking a line as a proof/document request.
const PROOF_KEYWORDS: &[&str] = &[
    "photo",
    "video",
    "facture",
    "invoice",
    "preuve",
    "proof",
    "bon de livraison",
    "etiquette",
    "label",
    "tracking number",
    "numero de suivi",
    "serial number",
    "numero de serie",
    "capture",
    "screenshot",
    "reference",
];

/// Leading verbs marking a line as a troubleshooting tip.
const TIP_VERBS: &[&str] = &[
    "verify", "verifi", "test", "charge", "try", "essay", "wait", "attend", "restart",
    "redemarr", "reset", "reinitialis", "compare", "compar",
];

/// One knowledge section returned by the retrieval collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeSection {
    pub id: String,
    pub section_id: String,
    pub title: String,
    pub content: String,
}

impl KnowledgeSection {
    /// Creates a new section.
    pub fn new(
        id: impl Into<String>,
        section_id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            section_id: section_id.into(),
            title: title.into(),
            content: content.into(),
        }
    }

    fn matches_any(&self, keywords: &[&str]) -> bool {
        let label = normalize(&format!("{} {}", self.section_id, self.title));
        contains_any(&label, keywords)
    }
}

/// One bullet line eligible for display as a seller hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementCandidate {
    /// Position of the source section after preference reordering.
    pub source_rank: usize,
    /// Bullet text without its leading marker.
    pub text: String,
    pub is_document_like: bool,
}

impl RequirementCandidate {
    fn new(source_rank: usize, text: &str) -> Self {
        Self {
            source_rank,
            text: text.to_string(),
            is_document_like: is_document_like(text),
        }
    }

    /// Display form, always bullet-prefixed.
    pub fn display(&self) -> String {
        if self.text.starts_with(BULLET) {
            self.text.clone()
        } else {
            format!("{}{}", BULLET, self.text)
        }
    }
}

/// Section id/title keywords that mark a section as relevant to a typology.
pub fn hint_keywords(typology: ProblemTypology) -> &'static [&'static str] {
    match typology {
        ProblemTypology::Unknown => &[],
        ProblemTypology::WrongItem => &["wrong", "different", "mauvais"],
        ProblemTypology::Damaged => &["damaged", "endommag", "casse", "degat"],
        ProblemTypology::Malfunction => &["malfunction", "defect", "panne", "fonctionne"],
        ProblemTypology::MissingParts => &["missing", "manquant", "incomplet", "accessoire"],
        ProblemTypology::Tracking => &["tracking", "suivi"],
        ProblemTypology::Delivery => &["delivery", "livraison", "colis", "lost"],
        ProblemTypology::Quality => &["quality", "qualite", "conforme"],
        ProblemTypology::Warranty => &["warranty", "garantie"],
        ProblemTypology::Size => &["size", "taille"],
        ProblemTypology::Refund => &["refund", "rembours"],
    }
}

/// True for proof-style lines (photo, invoice, label...).
///
/// Proof keywords win over tip verbs: "Verify the serial number" is a proof
/// request, "Restart the device" is a tip. Anything else counts as a document.
pub fn is_document_like(line: &str) -> bool {
    let normalized = normalize(line);
    if contains_any(&normalized, PROOF_KEYWORDS) {
        return true;
    }
    !TIP_VERBS.iter().any(|verb| normalized.starts_with(verb))
}

/// Filters, reorders and caps requirement lines from retrieved sections.
#[derive(Debug, Clone)]
pub struct RequirementRanker {
    max_items: usize,
    empty_text: String,
}

impl Default for RequirementRanker {
    fn default() -> Self {
        Self::new()
    }
}

impl RequirementRanker {
    /// Creates a ranker with the default cap and sentinel text.
    pub fn new() -> Self {
        Self {
            max_items: DEFAULT_MAX_REQUIREMENTS,
            empty_text: DEFAULT_EMPTY_REQUIREMENTS.to_string(),
        }
    }

    /// Sets the maximum number of lines returned.
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items.max(1);
        self
    }

    /// Sets the localized "nothing found" sentinel.
    pub fn with_empty_text(mut self, text: impl Into<String>) -> Self {
        self.empty_text = text.into();
        self
    }

    /// The sentinel returned when no candidate line exists.
    pub fn empty_text(&self) -> &str {
        &self.empty_text
    }

    /// Formats the ranked lines, or the sentinel when nothing was extractable.
    pub fn rank(&self, sections: &[KnowledgeSection], typology: ProblemTypology) -> String {
        let selected = self.select(sections, typology);
        if selected.is_empty() {
            return self.empty_text.clone();
        }
        selected
            .iter()
            .map(RequirementCandidate::display)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Returns the ranked candidates, at most `max_items`, deduplicated.
    pub fn select(
        &self,
        sections: &[KnowledgeSection],
        typology: ProblemTypology,
    ) -> Vec<RequirementCandidate> {
        let ordered = prefer_sections(sections, typology);
        let candidates = self.collect_candidates(&ordered);
        let mut unique = dedupe(candidates);

        unique.sort_by(|a, b| {
            a.source_rank
                .cmp(&b.source_rank)
                .then(b.is_document_like.cmp(&a.is_document_like))
                .then(a.text.chars().count().cmp(&b.text.chars().count()))
        });
        unique.truncate(self.max_items);
        unique
    }

    fn collect_candidates(&self, ordered: &[&KnowledgeSection]) -> Vec<RequirementCandidate> {
        let mut candidates = Vec::new();

        for (rank, section) in ordered.iter().enumerate() {
            candidates.extend(
                section
                    .content
                    .lines()
                    .filter_map(|line| line.trim_start().strip_prefix(BULLET))
                    .map(str::trim)
                    .filter(|text| !text.is_empty())
                    .map(|text| RequirementCandidate::new(rank, text)),
            );

            // The best match alone is rich enough; don't blend other sections in.
            if rank == 0 && candidates.len() >= self.max_items {
                break;
            }
        }

        candidates
    }
}

/// Moves typology-relevant sections to the front, keeping relative order.
fn prefer_sections(
    sections: &[KnowledgeSection],
    typology: ProblemTypology,
) -> Vec<&KnowledgeSection> {
    let original: Vec<&KnowledgeSection> = sections.iter().collect();
    if typology.is_unknown() {
        return original;
    }

    let hints = hint_keywords(typology);
    let (mut preferred, mut rest): (Vec<_>, Vec<_>) =
        original.iter().copied().partition(|s| s.matches_any(hints));

    // Vector retrieval often returns "damaged" sections for wrong-item queries.
    if typology == ProblemTypology::WrongItem && preferred.is_empty() {
        let damaged = hint_keywords(ProblemTypology::Damaged);
        (preferred, rest) = original.iter().copied().partition(|s| !s.matches_any(damaged));
    }

    if preferred.is_empty() {
        return original;
    }

    preferred.extend(rest);
    preferred
}

fn dedupe(candidates: Vec<RequirementCandidate>) -> Vec<RequirementCandidate> {
    let mut seen = std::collections::HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(normalize(&c.text)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(section_id: &str, title: &str, lines: &[&str]) -> KnowledgeSection {
        let content = lines
            .iter()
            .map(|l| format!("- {l}"))
            .collect::<Vec<_>>()
            .join("\n");
        KnowledgeSection::new(section_id, section_id, title, format!("Intro text\n{content}"))
    }

    mod document_like {
        use super::*;

        #[test]
        fn proof_keywords_are_documents() {
            assert!(is_document_like("Une photo du produit"));
            assert!(is_document_like("La facture d'achat"));
            assert!(is_document_like("Capture d'écran de la commande"));
        }

        #[test]
        fn tip_verbs_are_not_documents() {
            assert!(!is_document_like("Redémarrer l'appareil"));
            assert!(!is_document_like("Try charging overnight"));
            assert!(!is_document_like("Attendre 48h avant de relancer"));
        }

        #[test]
        fn proof_keyword_wins_over_tip_verb() {
            assert!(is_document_like("Vérifier le numéro de série"));
            assert!(is_document_like("Verify the tracking number"));
        }

        #[test]
        fn anything_else_defaults_to_document() {
            assert!(is_document_like("Le numéro de commande"));
        }
    }

    mod preference {
        use super::*;

        #[test]
        fn unknown_keeps_input_order() {
            let sections = vec![
                section("generic", "Generic", &["a"]),
                section("damaged", "Damaged", &["b"]),
            ];
            let ordered = prefer_sections(&sections, ProblemTypology::Unknown);
            assert_eq!(ordered[0].section_id, "generic");
        }

        #[test]
        fn matching_sections_move_first() {
            let sections = vec![
                section("generic", "Generic", &["a"]),
                section("warranty-claims", "Garantie", &["b"]),
            ];
            let ordered = prefer_sections(&sections, ProblemTypology::Warranty);
            assert_eq!(ordered[0].section_id, "warranty-claims");
            assert_eq!(ordered.len(), 2);
        }

        #[test]
        fn wrong_item_guard_excludes_damaged_sections_from_preferred() {
            let sections = vec![
                section("damaged-product", "Produit endommagé", &["Photo des dégâts"]),
                section("generic", "Generic", &["Numéro de commande"]),
            ];
            let ordered = prefer_sections(&sections, ProblemTypology::WrongItem);
            assert_eq!(ordered[0].section_id, "generic");
            assert_eq!(ordered[1].section_id, "damaged-product");
        }

        #[test]
        fn wrong_item_with_explicit_section_uses_it() {
            let sections = vec![
                section("generic", "Generic", &["x"]),
                section("wrong-item", "Wrong item", &["y"]),
            ];
            let ordered = prefer_sections(&sections, ProblemTypology::WrongItem);
            assert_eq!(ordered[0].section_id, "wrong-item");
        }

        #[test]
        fn no_preferred_section_keeps_input_order() {
            let sections = vec![
                section("b", "B", &["x"]),
                section("a", "A", &["y"]),
            ];
            let ordered = prefer_sections(&sections, ProblemTypology::Refund);
            assert_eq!(ordered[0].section_id, "b");
        }
    }

    mod ranking {
        use super::*;

        #[test]
        fn caps_at_three_and_removes_duplicates() {
            let sections: Vec<_> = (0..6)
                .map(|i| {
                    section(
                        &format!("s{i}"),
                        "Generic",
                        &["Photo du produit", "Facture", &format!("Ligne {i}"), "Photo du produit"],
                    )
                })
                .collect();

            let lines = RequirementRanker::new().select(&sections, ProblemTypology::Unknown);

            assert!(lines.len() <= 3);
            let mut texts: Vec<_> = lines.iter().map(|c| normalize(&c.text)).collect();
            texts.dedup();
            assert_eq!(texts.len(), lines.len());
        }

        #[test]
        fn stops_after_a_rich_top_section() {
            let sections = vec![
                section("damaged", "Damaged", &["Photo du colis", "Photo du produit", "Facture"]),
                section("other", "Other", &["Bon de livraison"]),
            ];

            let lines = RequirementRanker::new().select(&sections, ProblemTypology::Damaged);

            assert_eq!(lines.len(), 3);
            assert!(lines.iter().all(|c| c.source_rank == 0));
        }

        #[test]
        fn blends_sections_when_the_top_one_is_thin() {
            let sections = vec![
                section("damaged", "Damaged", &["Photo du colis"]),
                section("other", "Other", &["Bon de livraison", "Facture"]),
            ];

            let lines = RequirementRanker::new().select(&sections, ProblemTypology::Damaged);

            assert_eq!(lines.len(), 3);
            assert_eq!(lines[0].text, "Photo du colis");
            assert_eq!(lines[1].source_rank, 1);
        }

        #[test]
        fn documents_sort_before_tips_then_shorter_first() {
            let sections = vec![section(
                "malfunction",
                "Panne",
                &["Redémarrer l'appareil", "Facture d'achat originale", "Photo"],
            )];

            let lines = RequirementRanker::new().select(&sections, ProblemTypology::Malfunction);

            let texts: Vec<_> = lines.iter().map(|c| c.text.as_str()).collect();
            assert_eq!(
                texts,
                vec!["Photo", "Facture d'achat originale", "Redémarrer l'appareil"]
            );
        }

        #[test]
        fn dedup_compares_normalized_text() {
            let sections = vec![section("a", "A", &["Photo du produit", "photo du produit !"])];
            let lines = RequirementRanker::new().select(&sections, ProblemTypology::Unknown);
            assert_eq!(lines.len(), 1);
        }

        #[test]
        fn rank_renders_bullets_joined_by_newlines() {
            let sections = vec![section("a", "A", &["Photo", "Facture"])];
            let rendered = RequirementRanker::new().rank(&sections, ProblemTypology::Unknown);
            assert_eq!(rendered, "- Photo\n- Facture");
        }

        #[test]
        fn no_bullet_lines_yields_sentinel() {
            let sections = vec![KnowledgeSection::new("a", "a", "A", "Just prose, no bullets.")];
            let ranker = RequirementRanker::new().with_empty_text("nothing");
            assert_eq!(ranker.rank(&sections, ProblemTypology::Damaged), "nothing");
            assert_eq!(ranker.rank(&[], ProblemTypology::Damaged), "nothing");
        }

        #[test]
        fn ignores_non_bullet_lines() {
            let sections = vec![KnowledgeSection::new(
                "a",
                "a",
                "A",
                "Title\n* star item\n- dash item\n  - indented item",
            )];
            let lines = RequirementRanker::new().select(&sections, ProblemTypology::Unknown);
            let texts: Vec<_> = lines.iter().map(|c| c.text.as_str()).collect();
            assert_eq!(texts, vec!["dash item", "indented item"]);
        }
    }
}
