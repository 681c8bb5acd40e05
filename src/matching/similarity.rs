// src/matching/similarity.rs
use strsim::levenshtein;

/// Levenshtein similarity in [0, 1] after case-folding and trimming.
///
/// Equal strings score 1 (including two blanks); otherwise a blank side
/// scores 0. Lengths are counted in characters, so Persian text is not
/// penalised for multi-byte encoding.
pub fn string_similarity(a: &str, b: &str) -> f64 {
    let s1 = a.trim().to_lowercase();
    let s2 = b.trim().to_lowercase();

    if s1 == s2 {
        return 1.0;
    }
    if s1.is_empty() || s2.is_empty() {
        return 0.0;
    }

    let distance = levenshtein(&s1, &s2);
    let max_len = s1.chars().count().max(s2.chars().count());
    1.0 - distance as f64 / max_len as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_after_fold() {
        assert_eq!(string_similarity("John", "  JOHN "), 1.0);
        assert_eq!(string_similarity("", ""), 1.0);
    }

    #[test]
    fn test_blank_side_scores_zero() {
        assert_eq!(string_similarity("", "john"), 0.0);
        assert_eq!(string_similarity("john", "   "), 0.0);
    }

    #[test]
    fn test_edit_distance_ratio() {
        // one insertion over eight characters
        assert!((string_similarity("mohamad", "mohammad") - 0.875).abs() < 1e-9);
        // kitten/sitting: distance 3 over 7
        assert!((string_similarity("kitten", "sitting") - (1.0 - 3.0 / 7.0)).abs() < 1e-9);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        // one substitution over four Persian letters
        assert!((string_similarity("رضای", "رضاي") - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_symmetry_and_bounds() {
        let words = ["", "a", "bill", "william", "mohammad amiri", "محمد", "Zoë", "abc def"];
        for a in words {
            for b in words {
                let ab = string_similarity(a, b);
                let ba = string_similarity(b, a);
                assert_eq!(ab, ba, "asymmetric for {:?} / {:?}", a, b);
                assert!((0.0..=1.0).contains(&ab));
            }
            if !a.is_empty() {
                assert_eq!(string_similarity(a, a), 1.0);
            }
        }
    }
}
