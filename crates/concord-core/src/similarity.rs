//! Deterministic name similarity used when the oracle is unavailable.
//!
//! # Formula
//! ```text
//! a == b                   -> 100
//! a ⊂ b or b ⊂ a           -> 85
//! A, B = whitespace word sets
//! A or B empty             -> 0
//! otherwise                -> floor(200 * |A ∩ B| / (|A| + |B|))
//! ```
//! Both inputs are trimmed and lowercased first. The substring rule runs
//! before the word-set rule, so an empty string scores 85 against any
//! non-empty one.

use std::collections::HashSet;

pub const EXACT_SCORE: u8 = 100;
pub const SUBSTRING_SCORE: u8 = 85;

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Score two names on a 0-100 scale.
pub fn score(a: &str, b: &str) -> u8 {
    score_normalized(&normalize(a), &normalize(b))
}

fn score_normalized(a: &str, b: &str) -> u8 {
    if a == b {
        return EXACT_SCORE;
    }

    if a.contains(b) || b.contains(a) {
        return SUBSTRING_SCORE;
    }

    let words_a: HashSet<&str> = a.split_whitespace().collect();
    let words_b: HashSet<&str> = b.split_whitespace().collect();

    if words_a.is_empty() || words_b.is_empty() {
        return 0;
    }

    let common = words_a.intersection(&words_b).count();
    let total = words_a.len() + words_b.len();

    // Integer form of floor(2 * common / total * 100); common <= min(|A|, |B|)
    // keeps the result within 0..=100.
    ((200 * common) / total) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_exact_match_ignores_case_and_padding() {
        assert_eq!(score("ABC Corporation", "  abc corporation "), 100);
    }

    #[test]
    fn test_substring_match() {
        assert_eq!(score("Jane Smith", "Jane Smith LLC"), 85);
        assert_eq!(score("Jane Smith LLC", "jane smith"), 85);
    }

    #[test]
    fn test_empty_string_is_a_substring() {
        assert_eq!(score("", "Robert Johnson"), 85);
        assert_eq!(score("", ""), 100);
    }

    #[test]
    fn test_word_set_dice() {
        // {john, smith} vs {john, e., smith}: 2 * 2 / 5
        assert_eq!(score("john smith", "John E. Smith"), 80);
        // {robert, johnson} vs {bob, johnson}: 2 * 1 / 4
        assert_eq!(score("Robert Johnson", "Bob Johnson"), 50);
        // {jane, smith, llc} vs {john, e., smith}: 2 * 1 / 6
        assert_eq!(score("Jane Smith LLC", "John E. Smith"), 33);
    }

    #[test]
    fn test_no_overlap() {
        assert_eq!(score("ABC Corporation", "Robert Johnson"), 0);
    }

    #[test]
    fn test_duplicate_words_count_once() {
        // {smith} vs {smith, jones}: 2 * 1 / 3
        assert_eq!(score("smith smith", "jones smith"), 66);
    }

    #[test]
    fn test_whitespace_only_against_word() {
        // "   " normalizes to "" which is a substring of anything.
        assert_eq!(score("   ", "x"), 85);
    }

    proptest! {
        #[test]
        fn prop_identity(x in "[A-Za-z .]{1,24}") {
            prop_assert_eq!(score(&x, &x), 100);
            prop_assert_eq!(score(&x.to_uppercase(), &format!("  {}  ", x)), 100);
        }

        #[test]
        fn prop_symmetric(a in "[a-z]{1,6}( [a-z]{1,6}){0,4}", b in "[a-z]{1,6}( [a-z]{1,6}){0,4}") {
            prop_assert_eq!(score(&a, &b), score(&b, &a));
        }

        #[test]
        fn prop_bounded(a in "\\PC{0,40}", b in "\\PC{0,40}") {
            let s = score(&a, &b);
            prop_assert!(s <= 100);
        }
    }
}
