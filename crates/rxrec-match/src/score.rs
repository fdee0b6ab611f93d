//! Similarity scorers for drug names.
//!
//! Every scorer processes both strings the same way first (lower-case,
//! non-alphanumeric characters replaced by spaces, ends trimmed) and returns
//! an integer in `0..=100`. The base ratio is the Indel normalized
//! similarity, i.e. `2 * LCS / (len_a + len_b)`.

use std::collections::BTreeSet;

use rapidfuzz::distance::indel;
use rxrec_model::Scorer;

/// Default processing applied to both sides before scoring.
pub fn full_process(s: &str) -> String {
    let replaced: String = s
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
        .collect();
    replaced.to_lowercase().trim().to_string()
}

/// Ratio of two already-processed strings.
///
/// Identical strings score 100, an empty side otherwise scores 0. Halves
/// round to even.
pub fn ratio(a: &str, b: &str) -> u8 {
    if a == b {
        return 100;
    }
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let similarity = indel::normalized_similarity(a.chars(), b.chars());
    (similarity * 100.0).round_ties_even().clamp(0.0, 100.0) as u8
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn token_sort_ratio(a: &str, b: &str) -> u8 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

fn token_set_ratio(a: &str, b: &str) -> u8 {
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();

    let join = |tokens: Vec<&str>| tokens.join(" ");
    let intersection = join(tokens_a.intersection(&tokens_b).copied().collect());
    let only_a = join(tokens_a.difference(&tokens_b).copied().collect());
    let only_b = join(tokens_b.difference(&tokens_a).copied().collect());

    let combined_a = format!("{intersection} {only_a}").trim().to_string();
    let combined_b = format!("{intersection} {only_b}").trim().to_string();

    [
        ratio(&intersection, &combined_a),
        ratio(&intersection, &combined_b),
        ratio(&combined_a, &combined_b),
    ]
    .into_iter()
    .max()
    .unwrap_or(0)
}

/// Score `query` against `choice` with the given scorer.
pub fn score(scorer: Scorer, query: &str, choice: &str) -> u8 {
    let query = full_process(query);
    let choice = full_process(choice);
    if query.is_empty() || choice.is_empty() {
        return 0;
    }
    match scorer {
        Scorer::Ratio => ratio(&query, &choice),
        Scorer::TokenSortRatio => token_sort_ratio(&query, &choice),
        Scorer::TokenSetRatio => token_set_ratio(&query, &choice),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processing_strips_punctuation_and_case() {
        assert_eq!(full_process("  Acetaminophen, 500-MG! "), "acetaminophen  500 mg");
        assert_eq!(full_process("---"), "");
    }

    #[test]
    fn identical_names_score_100() {
        for scorer in [Scorer::Ratio, Scorer::TokenSortRatio, Scorer::TokenSetRatio] {
            assert_eq!(score(scorer, "Acetaminophen", "acetaminophen"), 100);
        }
    }

    #[test]
    fn empty_side_scores_zero() {
        assert_eq!(score(Scorer::TokenSetRatio, "", "aspirin"), 0);
        assert_eq!(score(Scorer::Ratio, "aspirin", "()"), 0);
    }

    #[test]
    fn ratio_matches_lcs_formula() {
        // LCS("abcd", "abce") = 3, so 2 * 3 / 8 = 0.75
        assert_eq!(ratio("abcd", "abce"), 75);
        assert_eq!(ratio("aspirin", "xyz"), 0);
    }

    #[test]
    fn token_sort_ignores_word_order() {
        assert_eq!(score(Scorer::TokenSortRatio, "sodium chloride", "chloride sodium"), 100);
        assert!(score(Scorer::Ratio, "sodium chloride", "chloride sodium") < 100);
    }

    #[test]
    fn token_set_ignores_extra_words() {
        assert_eq!(score(Scorer::TokenSetRatio, "amoxicillin", "amoxicillin trihydrate"), 100);
        assert!(score(Scorer::TokenSortRatio, "amoxicillin", "amoxicillin trihydrate") < 100);
    }

    #[test]
    fn unrelated_names_score_low() {
        assert!(score(Scorer::TokenSetRatio, "metformin", "salbutamol") < 50);
    }
}
