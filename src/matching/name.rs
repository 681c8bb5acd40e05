// src/matching/name.rs - Name similarity scoring
use crate::matching::normalize::extract_name_parts;
use crate::matching::similarity::string_similarity;
use crate::models::SimilarityScore;

/// Part and full-name similarities must exceed this to count as evidence.
pub const NAME_SIMILARITY_THRESHOLD: f64 = 0.8;
const SAME_FIRST_AND_LAST_SCORE: f64 = 0.9;
const NICKNAME_SCORE: f64 = 0.85;

/// Canonical given names and their common short forms.
pub const NICKNAMES: [(&str, &[&str]); 21] = [
    ("william", &["bill", "will", "billy"]),
    ("robert", &["bob", "rob", "bobby"]),
    ("richard", &["rick", "dick", "rich"]),
    ("michael", &["mike", "mick"]),
    ("elizabeth", &["liz", "beth", "betty"]),
    ("margaret", &["meg", "maggie", "peggy"]),
    ("catherine", &["cathy", "kate", "katie"]),
    ("christopher", &["chris"]),
    ("anthony", &["tony"]),
    ("patricia", &["pat", "patty"]),
    ("jennifer", &["jen", "jenny"]),
    ("jonathan", &["jon", "john"]),
    ("matthew", &["matt"]),
    ("andrew", &["andy", "drew"]),
    ("joshua", &["josh"]),
    ("daniel", &["dan", "danny"]),
    ("david", &["dave", "davy"]),
    ("joseph", &["joe", "joey"]),
    ("thomas", &["tom", "tommy"]),
    ("james", &["jim", "jimmy"]),
    ("samuel", &["sam", "sammy"]),
];

/// True when the two given names are a canonical name and one of its short
/// forms, or two short forms of the same name.
pub fn is_nickname_pair(first1: &str, first2: &str) -> bool {
    NICKNAMES.iter().any(|(canonical, nicks)| {
        (first1 == *canonical && nicks.contains(&first2))
            || (first2 == *canonical && nicks.contains(&first1))
            || (nicks.contains(&first1) && nicks.contains(&first2))
    })
}

fn percent(similarity: f64) -> u32 {
    (similarity * 100.0).round() as u32
}

/// Scores how likely two names denote the same person.
///
/// The result is the strongest of several signals; reasons are collected in
/// signal order for every signal that cleared its threshold.
pub fn score_names(name1: &str, name2: &str) -> SimilarityScore {
    let parts1 = extract_name_parts(name1);
    let parts2 = extract_name_parts(name2);

    if parts1.full == parts2.full {
        return SimilarityScore {
            similarity: 1.0,
            reasons: vec!["Exact name match".to_string()],
        };
    }

    let mut max_similarity: f64 = 0.0;
    let mut reasons = Vec::new();

    let full_similarity = string_similarity(&parts1.full, &parts2.full);
    if full_similarity > max_similarity {
        max_similarity = full_similarity;
        if full_similarity > NAME_SIMILARITY_THRESHOLD {
            reasons.push(format!(
                "Very similar full name ({}% match)",
                percent(full_similarity)
            ));
        }
    }

    let has_first_and_last = !parts1.first.is_empty()
        && !parts1.last.is_empty()
        && !parts2.first.is_empty()
        && !parts2.last.is_empty();

    if has_first_and_last && parts1.first == parts2.first && parts1.last == parts2.last {
        max_similarity = max_similarity.max(SAME_FIRST_AND_LAST_SCORE);
        reasons.push("Same first and last name".to_string());
    }

    if has_first_and_last {
        let first_sim = string_similarity(&parts1.first, &parts2.first);
        let last_sim = string_similarity(&parts1.last, &parts2.last);
        if first_sim > NAME_SIMILARITY_THRESHOLD && last_sim > NAME_SIMILARITY_THRESHOLD {
            let avg_sim = (first_sim + last_sim) / 2.0;
            if avg_sim > max_similarity {
                max_similarity = avg_sim;
                reasons.push(format!(
                    "Similar first and last names ({}% match)",
                    percent(avg_sim)
                ));
            }
        }
    }

    if is_nickname_pair(&parts1.first, &parts2.first) {
        max_similarity = max_similarity.max(NICKNAME_SCORE);
        reasons.push("Possible nickname match".to_string());
    }

    SimilarityScore {
        similarity: max_similarity,
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_short_circuits() {
        let score = score_names("John Smith", "  john   SMITH ");
        assert_eq!(score.similarity, 1.0);
        assert_eq!(score.reasons, vec!["Exact name match"]);
    }

    #[test]
    fn test_exact_match_after_suffix_and_accent_removal() {
        let score = score_names("José Smith Jr.", "Jose Smith");
        assert_eq!(score.similarity, 1.0);
    }

    #[test]
    fn test_one_letter_misspelling() {
        let score = score_names("Mohamad Amiri", "Mohammad Amiri");
        // full: 1 edit over 14 chars; parts: (0.875 + 1.0) / 2
        assert!((score.similarity - 0.9375).abs() < 1e-9);
        assert_eq!(
            score.reasons,
            vec![
                "Very similar full name (93% match)",
                "Similar first and last names (94% match)"
            ]
        );
    }

    #[test]
    fn test_same_first_and_last_with_different_middle() {
        let score = score_names("John Ronald Smith", "John Peter Smith");
        assert!(score.similarity >= 0.9);
        assert!(score.reasons.contains(&"Same first and last name".to_string()));
    }

    #[test]
    fn test_nickname_match() {
        let score = score_names("Bill Johnson", "William Johnson");
        assert_eq!(score.similarity, 0.85);
        assert_eq!(score.reasons, vec!["Possible nickname match"]);
    }

    #[test]
    fn test_nickname_pairs_in_both_directions_and_between_short_forms() {
        assert!(is_nickname_pair("robert", "bob"));
        assert!(is_nickname_pair("bob", "robert"));
        assert!(is_nickname_pair("bobby", "rob"));
        assert!(!is_nickname_pair("bob", "bill"));
        assert!(!is_nickname_pair("", ""));
    }

    #[test]
    fn test_unrelated_names_have_no_reasons() {
        let score = score_names("Alice Brown", "Robert Smith");
        assert!(score.similarity < 0.3);
        assert!(score.reasons.is_empty());
    }

    #[test]
    fn test_persian_names_with_variant_letters_match_exactly() {
        let score = score_names("علی کریمی", "علي كريمي");
        assert_eq!(score.similarity, 1.0);
    }

    #[test]
    fn test_single_token_given_name_matches_family_name_spelling() {
        // first == last for single tokens, so the two read as equal
        let score = score_names("Amiri", "amiri");
        assert_eq!(score.similarity, 1.0);
    }
}
