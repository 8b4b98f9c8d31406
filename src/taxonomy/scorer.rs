use rapidfuzz::distance::indel;
use std::collections::BTreeSet;

/// String similarity on a `0..=100` scale. Must be deterministic for fixed inputs.
pub(crate) trait Scorer {
    fn score(&self, query: &str, candidate: &str) -> f64;
}

/// Token set ratio: whitespace tokens are compared as sets, so word order and
/// extra tokens on one side do not lower the score.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct TokenSetScorer;

impl Scorer for TokenSetScorer {
    fn score(&self, query: &str, candidate: &str) -> f64 {
        token_set_ratio(query, candidate)
    }
}

pub(crate) fn token_set_ratio(left: &str, right: &str) -> f64 {
    let left_tokens: BTreeSet<&str> = left.split_whitespace().collect();
    let right_tokens: BTreeSet<&str> = right.split_whitespace().collect();
    if left_tokens.is_empty() || right_tokens.is_empty() {
        return 0.0;
    }

    let common: Vec<&str> = left_tokens.intersection(&right_tokens).copied().collect();
    let left_only: Vec<&str> = left_tokens.difference(&right_tokens).copied().collect();
    let right_only: Vec<&str> = right_tokens.difference(&left_tokens).copied().collect();
    // one side is a subset of the other
    if !common.is_empty() && (left_only.is_empty() || right_only.is_empty()) {
        return 100.0;
    }

    let common = common.join(" ");
    let with_common = |rest: &[&str]| {
        if common.is_empty() {
            rest.join(" ")
        } else {
            format!("{common} {}", rest.join(" "))
        }
    };
    let left_full = with_common(&left_only);
    let right_full = with_common(&right_only);

    let mut best = indel_ratio(&left_full, &right_full);
    if !common.is_empty() {
        best = best
            .max(indel_ratio(&common, &left_full))
            .max(indel_ratio(&common, &right_full));
    }
    best
}

/// Normalized Indel similarity: `200 * lcs / (len(left) + len(right))`.
pub(crate) fn indel_ratio(left: &str, right: &str) -> f64 {
    if left.is_empty() && right.is_empty() {
        return 100.0;
    }
    100.0 * indel::normalized_similarity(left.chars(), right.chars())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indel() {
        assert_eq!(indel_ratio("", ""), 100.0);
        assert_eq!(indel_ratio("abc", ""), 0.0);
        assert_eq!(indel_ratio("abcd", "abcd"), 100.0);
        assert_eq!(indel_ratio("abcd", "abxd"), 75.0);
        assert!((indel_ratio("margin", "profit") - 100.0 * 4.0 / 12.0).abs() < 1e-9);
    }

    #[test]
    fn token_sets() {
        assert_eq!(token_set_ratio("reported ebitda", "ebitda reported"), 100.0);
        assert_eq!(token_set_ratio("ebitda", "reported ebitda"), 100.0);
        assert_eq!(token_set_ratio("", "sales"), 0.0);
        let score = token_set_ratio("gross margin", "gross profit");
        assert!(score > 60.0 && score < 70.0, "{score}");
        assert!(token_set_ratio("headcount", "net sales") < 50.0);
    }

    #[test]
    fn scorer_is_symmetric_for_token_sets() {
        let scorer = TokenSetScorer;
        assert_eq!(scorer.score("net working capital", "working capital adjusted"), scorer.score("working capital adjusted", "net working capital"));
    }
}
