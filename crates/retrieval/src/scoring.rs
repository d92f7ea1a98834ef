//! Relevance scoring for the in-memory store.
//!
//! Pure functions:
//! - Cosine similarity over embeddings
//! - Keyword overlap over lowercase word tokens

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if either vector is zero-length or empty.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Split text into lowercase search terms.
///
/// Short ASCII words ("in", "a", "of") carry no signal and are dropped.
/// Non-ASCII words are kept whole since CJK text has no spaces to split on.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .filter(|w| !w.is_ascii() || w.len() >= 3)
        .map(|w| w.to_lowercase())
        .collect()
}

/// Count how many distinct query terms occur in `haystack`.
///
/// `haystack` must already be lowercase.
pub fn keyword_score(terms: &[String], haystack: &str) -> f32 {
    let mut seen: Vec<&str> = Vec::with_capacity(terms.len());
    let mut score = 0.0;
    for term in terms {
        if seen.contains(&term.as_str()) {
            continue;
        }
        seen.push(term);
        if haystack.contains(term.as_str()) {
            score += 1.0;
        }
    }
    score
}

/// Order `(score, index)` pairs by descending score, stable on ties.
pub fn rank(mut scored: Vec<(f32, usize)>, limit: usize) -> Vec<usize> {
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);
    scored.into_iter().map(|(_, i)| i).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_identical_vectors() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_orthogonal_vectors() {
        let sim = cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]);
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn cosine_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn cosine_known_value() {
        // 1 / sqrt(2)
        let sim = cosine_similarity(&[1.0, 1.0], &[1.0, 0.0]);
        assert!((sim - 0.7071).abs() < 0.001);
    }

    #[test]
    fn tokenize_drops_short_ascii_words() {
        assert_eq!(tokenize("Ramen in Tokyo!"), vec!["ramen", "tokyo"]);
        assert_eq!(tokenize("東京 の エンジニア"), vec!["東京", "の", "エンジニア"]);
        assert!(tokenize("  ").is_empty());
    }

    #[test]
    fn keyword_score_counts_distinct_terms() {
        let terms = tokenize("rust rust engineer tokyo");
        let score = keyword_score(&terms, "senior rust engineer | remote");
        assert_eq!(score, 2.0);
    }

    #[test]
    fn rank_is_stable_on_ties() {
        let order = rank(vec![(1.0, 0), (2.0, 1), (1.0, 2), (0.5, 3)], 3);
        assert_eq!(order, vec![1, 0, 2]);
    }
}
