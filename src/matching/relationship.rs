// src/matching/relationship.rs - Father linkage as supporting evidence
use crate::matching::name::NAME_SIMILARITY_THRESHOLD;
use crate::matching::similarity::string_similarity;
use crate::models::{CandidatePerson, Person, SimilarityScore};

pub const SAME_FATHER_ID_BONUS: f64 = 0.3;
pub const SIMILAR_FATHER_NAME_BONUS: f64 = 0.2;

/// Additive context from father linkage. This is never reported on its own;
/// the detector adds it to the name score.
pub fn score_relationship(candidate: &CandidatePerson, existing: &Person) -> SimilarityScore {
    let same_father_id = match (&candidate.father_id, &existing.father_id) {
        (Some(a), Some(b)) => !a.is_empty() && a == b,
        _ => false,
    };

    if same_father_id {
        return SimilarityScore {
            similarity: SAME_FATHER_ID_BONUS,
            reasons: vec!["Same father ID".to_string()],
        };
    }

    if let (Some(a), Some(b)) = (&candidate.father_name, &existing.father_name) {
        if !a.is_empty()
            && !b.is_empty()
            && string_similarity(a, b) > NAME_SIMILARITY_THRESHOLD
        {
            return SimilarityScore {
                similarity: SIMILAR_FATHER_NAME_BONUS,
                reasons: vec!["Similar father name".to_string()],
            };
        }
    }

    SimilarityScore::default()
}
