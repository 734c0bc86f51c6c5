//! Deterministic post-processing of model output

/// Appended to answers cut by [`truncate_words`]
pub const ELLIPSIS: char = '…';

/// Terms counted by [`lexical_safety_score`]
const FLAGGED_TERMS: &[&str] = &["estúpido", "idiota", "odiar", "matar"];

/// Penalty per flagged term found
const PENALTY_PER_HIT: f64 = 0.2;

/// Soft-truncate `text` to at most `max_words` whitespace-separated words
///
/// Text within the limit is returned unchanged (original spacing kept).
/// Longer text is rejoined with single spaces and gets [`ELLIPSIS`] appended.
/// `None` disables truncation.
pub fn truncate_words(text: &str, max_words: Option<usize>) -> String {
    let Some(max_words) = max_words else {
        return text.to_string();
    };

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return text.to_string();
    }

    let mut truncated = words[..max_words].join(" ");
    truncated.push(ELLIPSIS);
    truncated
}

/// Placeholder safety score in `[0.0, 1.0]`, where 1.0 means no flagged term
/// was found in the lowercased text
///
/// This is a lexical heuristic, not a moderation model. It only annotates
/// traces and never blocks a response.
pub fn lexical_safety_score(text: &str) -> f64 {
    let lowered = text.to_lowercase();
    let hits = FLAGGED_TERMS
        .iter()
        .filter(|term| lowered.contains(*term))
        .count();

    if hits == 0 {
        1.0
    } else {
        (1.0 - PENALTY_PER_HIT * hits as f64).max(0.0)
    }
}

/// 1.0 if the answer has any non-whitespace content, else 0.0
pub fn non_empty_score(text: &str) -> f64 {
    if text.trim().is_empty() {
        0.0
    } else {
        1.0
    }
}
