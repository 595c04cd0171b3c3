// Shannon entropy over the character distribution of a string

use std::collections::BTreeMap;

/// Shannon entropy (base 2) of `text`. Empty input has entropy 0.
///
/// Terms are summed in character order, so the result is bit-for-bit
/// reproducible.
pub fn shannon_entropy(text: &str) -> f64 {
    let mut counts: BTreeMap<char, usize> = BTreeMap::new();
    let mut total = 0usize;

    for c in text.chars() {
        *counts.entry(c).or_insert(0) += 1;
        total += 1;
    }

    if total == 0 {
        return 0.0;
    }

    let total = total as f64;
    let entropy: f64 = counts
        .values()
        .map(|&count| {
            let p = count as f64 / total;
            -p * p.log2()
        })
        .sum();

    // A single repeated character sums to -0.0
    if entropy > 0.0 {
        entropy
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_string() {
        assert_eq!(shannon_entropy(""), 0.0);
    }

    #[test]
    fn test_repeated_character() {
        let entropy = shannon_entropy("aaaaaaaa");
        assert_eq!(entropy, 0.0);
        assert!(entropy.is_sign_positive());
    }

    #[test]
    fn test_two_equiprobable_characters() {
        assert!((shannon_entropy("abab") - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_distinct_characters() {
        // 8 distinct characters -> log2(8)
        assert!((shannon_entropy("abcdefgh") - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        // Two distinct chars, each multi-byte
        assert!((shannon_entropy("éü") - 1.0).abs() < 1e-12);
    }
}
