//! Proposal extraction from assistant replies.
//!
//! The assistant writes prose with up to three marker zones, in order:
//!
//! ```text
//! <intro>
//! 📝 Message proposé au vendeur: <proposed message>
//! 💡 Le vendeur pourrait aussi demander: <seller hints>
//! Cliquez sur le bouton Approuver ...
//! ```
//!
//! Replies from older prompts use a single English sentence followed by a
//! `--` delimited block. Both shapes are handled; anything else is treated as
//! plain conversation (`intro` only).

use serde::{Deserialize, Serialize};

use super::normalizer::{contains_any, normalize};

/// Proposal markers, tried in order.
pub const PROPOSAL_MARKERS: &[&str] = &["📝", "✉️"];

/// Seller-hints markers, tried in order.
pub const SELLER_HINTS_MARKERS: &[&str] = &[
    "💡",
    "Le vendeur pourrait aussi demander",
    "Informations utiles pour le vendeur",
];

/// Approval-prompt markers, tried in order, case-insensitive.
pub const APPROVAL_MARKERS: &[&str] = &[
    "Cliquez sur le bouton Approuver",
    "Cliquez sur « Approuver »",
    "Si ce message vous convient",
    "Souhaitez-vous que j'envoie ce message",
    "Voulez-vous envoyer ce message",
];

const LEGACY_MARKER: &str = "here is a message you could send to the seller";
const LEGACY_EXTRA_BLOCK: &str = "I can also provide";
const LEGACY_CLOSING: &str = "Thank you";

/// Signature placeholders replaced by the customer's name.
pub const NAME_PLACEHOLDERS: &[&str] = &[
    "[Your name]",
    "[Your Name]",
    "[your name]",
    "[YOUR NAME]",
    "[Votre nom]",
    "[Votre Nom]",
    "[votre nom]",
];

/// Normalized words revealing a header that leaked past the colon.
const HEADER_LEAK_WORDS: &[&str] = &["message propose", "au vendeur"];

const BOLD: &str = "**";

/// Structured view of one assistant reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedMessage {
    pub intro: String,
    pub proposed_message: String,
    pub seller_hints: String,
    pub approval_prompt: String,
}

impl ProposedMessage {
    /// Intro-only result for replies without any marker.
    pub fn plain(text: &str) -> Self {
        Self {
            intro: text.trim().to_string(),
            ..Self::default()
        }
    }

    /// True if a non-blank proposed message was extracted.
    pub fn has_proposal(&self) -> bool {
        !self.proposed_message.trim().is_empty()
    }
}

/// Segments assistant replies into a [`ProposedMessage`].
#[derive(Debug, Clone)]
pub struct ProposalExtractor {
    customer_name: Option<String>,
    show_seller_hints: bool,
}

impl Default for ProposalExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ProposalExtractor {
    pub fn new() -> Self {
        Self {
            customer_name: None,
            show_seller_hints: true,
        }
    }

    /// Name substituted into signature placeholders. Blank names are ignored.
    pub fn with_customer_name(mut self, name: Option<&str>) -> Self {
        self.customer_name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        self
    }

    /// When false, `seller_hints` is always left empty.
    pub fn with_seller_hints(mut self, show: bool) -> Self {
        self.show_seller_hints = show;
        self
    }

    /// Extracts the proposal zones from one assistant reply.
    pub fn extract(&self, response: &str) -> ProposedMessage {
        match find_first_marker(response, PROPOSAL_MARKERS, 0) {
            Some(marker) => self.extract_marked(response, marker),
            None => self.extract_legacy(response),
        }
    }

    fn extract_marked(&self, response: &str, proposal: Span) -> ProposedMessage {
        let hints = find_first_marker(response, SELLER_HINTS_MARKERS, proposal.end);
        let approval = find_first_marker(response, APPROVAL_MARKERS, proposal.end);

        let proposal_end = hints
            .or(approval)
            .map(|span| span.start)
            .unwrap_or(response.len());

        let segment = &response[proposal.end..proposal_end];
        let proposed_message = drop_leaked_header(&self.finish_text(after_colon(segment)));

        let seller_hints = match hints {
            Some(span) if self.show_seller_hints => {
                let end = approval
                    .filter(|a| a.start >= span.end)
                    .map(|a| a.start)
                    .unwrap_or(response.len());
                let segment = &response[span.end..end];
                let body = segment.split_once(':').map_or(segment, |(_, rest)| rest);
                strip_bold(body).trim().to_string()
            }
            _ => String::new(),
        };

        let approval_prompt = approval
            .map(|span| response[span.start..].trim().to_string())
            .unwrap_or_default();

        ProposedMessage {
            intro: response[..proposal.start].trim().to_string(),
            proposed_message,
            seller_hints,
            approval_prompt,
        }
    }

    fn extract_legacy(&self, response: &str) -> ProposedMessage {
        let Some(marker) = find_ci(response, LEGACY_MARKER, 0) else {
            return ProposedMessage::plain(response);
        };

        let after = &response[marker.end..];
        let body = between_delimiters(after).unwrap_or(after);
        let body = strip_extra_block(body);
        let body = body.trim_start_matches([':', '.']);

        ProposedMessage {
            intro: response[..marker.start].trim().to_string(),
            proposed_message: self.finish_text(body),
            ..ProposedMessage::default()
        }
    }

    /// Strips bold markers and fills in the signature.
    fn finish_text(&self, text: &str) -> String {
        let mut text = strip_bold(text);
        if let Some(name) = &self.customer_name {
            for placeholder in NAME_PLACEHOLDERS {
                text = text.replace(placeholder, name);
            }
        }
        text.trim().to_string()
    }
}

// ───────────────────────────────────────────────────────────────
// Text helpers
// ───────────────────────────────────────────────────────────────

/// Byte range of a marker occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: usize,
    end: usize,
}

/// First occurrence, at or after `from`, of the first marker in `markers`
/// that occurs at all. Marker order is priority, not position.
fn find_first_marker(text: &str, markers: &[&str], from: usize) -> Option<Span> {
    markers.iter().find_map(|marker| find_ci(text, marker, from))
}

/// Case-insensitive substring search returning byte offsets into `haystack`.
fn find_ci(haystack: &str, needle: &str, from: usize) -> Option<Span> {
    if needle.is_empty() || from > haystack.len() || !haystack.is_char_boundary(from) {
        return None;
    }

    haystack[from..]
        .char_indices()
        .map(|(offset, _)| from + offset)
        .find_map(|start| {
            matches_at(&haystack[start..], needle).map(|len| Span {
                start,
                end: start + len,
            })
        })
}

/// Byte length consumed in `text` if it starts with `needle`, ignoring case.
fn matches_at(text: &str, needle: &str) -> Option<usize> {
    let mut chars = text.chars();
    let mut consumed = 0;
    for expected in needle.chars() {
        let actual = chars.next()?;
        if !chars_match(actual, expected) {
            return None;
        }
        consumed += actual.len_utf8();
    }
    Some(consumed)
}

fn chars_match(a: char, b: char) -> bool {
    if a == b {
        return true;
    }
    let apostrophes = ['\'', '’'];
    if apostrophes.contains(&a) && apostrophes.contains(&b) {
        return true;
    }
    a.to_lowercase().eq(b.to_lowercase())
}

/// Everything after the first colon. Without a colon the header line is
/// skipped instead.
fn after_colon(segment: &str) -> &str {
    match segment.split_once(':') {
        Some((_, rest)) => rest,
        None => segment.split_once('\n').map_or(segment, |(_, rest)| rest),
    }
}

fn strip_bold(text: &str) -> String {
    text.replace(BOLD, "")
}

/// Drops a first line that repeats the proposal header, if more lines follow.
fn drop_leaked_header(text: &str) -> String {
    match text.split_once('\n') {
        Some((first, rest))
            if contains_any(&normalize(first), HEADER_LEAK_WORDS) && !rest.trim().is_empty() =>
        {
            rest.trim().to_string()
        }
        _ => text.to_string(),
    }
}

fn is_delimiter_line(line: &str) -> bool {
    let line = line.trim();
    line.len() >= 2 && line.chars().all(|c| c == '-')
}

/// Text between the first two `--` delimiter lines, if both exist.
fn between_delimiters(text: &str) -> Option<&str> {
    let mut offset = 0;
    let mut opening = None;

    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        if !is_delimiter_line(line) {
            continue;
        }
        match opening {
            None => opening = Some(offset),
            Some(start) => return Some(&text[start..line_start]),
        }
    }

    None
}

/// Removes an "I can also provide..." block, keeping a trailing closing line.
fn strip_extra_block(text: &str) -> String {
    let Some(extra) = find_ci(text, LEGACY_EXTRA_BLOCK, 0) else {
        return text.to_string();
    };

    let kept = text[..extra.start].trim_end();
    match find_ci(text, LEGACY_CLOSING, extra.end) {
        Some(closing) => format!("{}\n\n{}", kept, text[closing.start..].trim()),
        None => kept.to_string(),
    }
}
