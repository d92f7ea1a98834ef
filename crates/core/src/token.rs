//! Token estimation utilities.
//!
//! Uses a character-based heuristic: ~4 characters per token. Only used to
//! compare spans against a budget, so under- or over-counting is tolerated.

/// Estimate the token count for a string.
///
/// Heuristic: 1 token ≈ 4 characters. Rounds up. Counts characters, not
/// bytes, so Japanese text is not charged three times over.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}
