//! Text canonicalization used for every keyword comparison in the drafting
//! pipeline.
//!
//! `normalize` is pure and idempotent: case-folded, diacritics removed,
//! punctuation turned into spaces, whitespace collapsed.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Literal bullet prefix stripped from normalized text.
const BULLET_PREFIX: &str = "- ";

/// Canonicalizes free text for substring matching.
///
/// # Steps
/// 1. Trim and lowercase
/// 2. Unicode-decompose (NFD) and drop combining marks
/// 3. Replace anything that is not a letter, digit or whitespace with a space
/// 4. Collapse whitespace runs and trim
/// 5. Strip a leading `"- "` bullet if one survived
pub fn normalize(text: &str) -> String {
    let folded = text.trim().to_lowercase();

    let cleaned: String = folded
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    match collapsed.strip_prefix(BULLET_PREFIX) {
        Some(rest) => rest.to_string(),
        None => collapsed,
    }
}

/// True if `normalized` contains any of the (already normalized) needles.
pub(crate) fn contains_any(normalized: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| normalized.contains(needle))
}
