//! Text similarity measures shared by the ranker and the degraded stance
//! path: token-set overlap, character edit ratio, and embedding cosine.
//!
//! The lexical measures are deliberately cheap and infallible; they back the
//! degraded path when the embedding model is unavailable. Absolute values
//! are not comparable with cosine scores, but both rank higher-overlap
//! candidates higher.

use std::collections::BTreeSet;

/// Tokenize for overlap scoring: lowercase, alnum, split.
/// Uses BTreeSet downstream for deterministic iteration order.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty() && s.len() >= 2) // Skip single chars
        .map(String::from)
        .collect()
}

/// Jaccard overlap of the two token sets, in [0,1].
/// Either side tokenizing to nothing scores 0.0.
pub fn token_overlap(a: &str, b: &str) -> f32 {
    let ta: BTreeSet<String> = tokenize(a).into_iter().collect();
    let tb: BTreeSet<String> = tokenize(b).into_iter().collect();
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    let inter = ta.intersection(&tb).count();
    let union = ta.union(&tb).count();
    inter as f32 / union as f32
}

/// Character-level edit similarity: `1 - levenshtein / max_len`, in [0,1].
/// Two-row dynamic program, O(|a|*|b|) time, O(|b|) space.
pub fn edit_ratio(a: &str, b: &str) -> f32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let dist = prev[b.len()];
    1.0 - dist as f32 / a.len().max(b.len()) as f32
}

/// Degraded-path similarity: case-folded max of edit ratio and token overlap.
pub fn lexical_similarity(a: &str, b: &str) -> f32 {
    let la = a.to_lowercase();
    let lb = b.to_lowercase();
    edit_ratio(&la, &lb).max(token_overlap(&la, &lb))
}

/// Cosine similarity of two embedding vectors, clamped to [0,1].
/// Mismatched or zero-norm vectors score 0.0.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn tokenize_lowercases_and_drops_short_tokens() {
        let tokens = tokenize("Free Electricity, for ALL citizens! A");
        assert_eq!(tokens, vec!["free", "electricity", "for", "all", "citizens"]);
    }

    #[test]
    fn token_overlap_of_identical_texts_is_one() {
        assert_relative_eq!(token_overlap("free power for all", "free power for all"), 1.0);
    }

    #[test]
    fn token_overlap_of_disjoint_texts_is_zero() {
        assert_eq!(token_overlap("solar farms expand", "bank fraud ring"), 0.0);
    }

    #[test]
    fn token_overlap_partial() {
        // {free, electricity, citizens} vs {free, electricity, scheme}:
        // 2 shared of 4 distinct.
        assert_relative_eq!(
            token_overlap("free electricity citizens", "free electricity scheme"),
            0.5
        );
    }

    #[test]
    fn edit_ratio_bounds() {
        assert_eq!(edit_ratio("", ""), 1.0);
        assert_eq!(edit_ratio("claim", ""), 0.0);
        assert_eq!(edit_ratio("abc", "abc"), 1.0);
        assert_eq!(edit_ratio("abc", "xyz"), 0.0);
    }

    #[test]
    fn edit_ratio_single_substitution() {
        // One edit across four characters.
        assert_relative_eq!(edit_ratio("fake", "face"), 0.75);
    }

    #[test]
    fn lexical_similarity_takes_the_max() {
        // Token overlap is high, edit ratio lower after reordering.
        let sim = lexical_similarity("electricity free for all", "free for all electricity");
        assert_relative_eq!(sim, 1.0); // identical token sets
    }

    #[test]
    fn cosine_basics() {
        assert_relative_eq!(cosine(&[1.0, 0.0], &[1.0, 0.0]), 1.0);
        assert_eq!(cosine(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        // Opposed vectors clamp to 0 rather than going negative.
        assert_eq!(cosine(&[1.0, 0.0], &[-1.0, 0.0]), 0.0);
        assert_eq!(cosine(&[], &[]), 0.0);
        assert_eq!(cosine(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }
}
