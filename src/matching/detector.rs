// src/matching/detector.rs - Duplicate decision engine
//!
//! Scores a candidate against every existing person, ranks the pairs that
//! clear the inclusion threshold and maps the best one to an action. Pure and
//! synchronous: safe to re-run inside a retried transaction.

use log::debug;

use crate::matching::name::{score_names, NAME_SIMILARITY_THRESHOLD};
use crate::matching::normalize::normalize_name;
use crate::matching::relationship::score_relationship;
use crate::matching::similarity::string_similarity;
use crate::models::{CandidatePerson, DuplicateDetectionResult, DuplicateMatch, Person, SuggestedAction};
use crate::utils::detection_config::DetectionConfig;

/// Father names at or below this similarity are treated as different men.
pub const FATHER_SPELLING_VARIATION_THRESHOLD: f64 = 0.7;
/// Name similarity above which different fathers only get the mild dampening.
pub const MODERATE_NAME_SIMILARITY: f64 = 0.6;

/// Multiply-then-cap adjustment applied to a pair's confidence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dampening {
    pub factor: f64,
    pub cap: f64,
}

impl Dampening {
    pub fn apply(&self, confidence: f64) -> f64 {
        (confidence * self.factor).min(self.cap)
    }
}

/// Very similar names, clearly different fathers.
pub const DIFFERENT_FATHERS_STRONG: Dampening = Dampening { factor: 0.2, cap: 0.3 };
/// Moderately similar names, clearly different fathers.
pub const DIFFERENT_FATHERS_MODERATE: Dampening = Dampening { factor: 0.4, cap: 0.5 };
/// Father names differ only by spelling.
pub const FATHER_SPELLING_VARIATION: Dampening = Dampening { factor: 0.8, cap: 0.7 };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FatherComparison {
    /// One side has no father name.
    Unknown,
    Same,
    ClearlyDifferent,
    SpellingVariation,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn compare_fathers(candidate: &CandidatePerson, existing: &Person) -> FatherComparison {
    let (Some(a), Some(b)) = (present(&candidate.father_name), present(&existing.father_name))
    else {
        return FatherComparison::Unknown;
    };

    let norm_a = normalize_name(a);
    let norm_b = normalize_name(b);
    if norm_a == norm_b {
        FatherComparison::Same
    } else if string_similarity(&norm_a, &norm_b) > FATHER_SPELLING_VARIATION_THRESHOLD {
        FatherComparison::SpellingVariation
    } else {
        FatherComparison::ClearlyDifferent
    }
}

/// Maps the top confidence to the action the write path must take.
pub fn suggested_action_for(confidence: f64, config: &DetectionConfig) -> SuggestedAction {
    if confidence >= config.block_threshold {
        SuggestedAction::Block
    } else if confidence >= config.review_threshold {
        SuggestedAction::Review
    } else {
        SuggestedAction::Proceed
    }
}

/// Scores one candidate/existing pair. Returns the pair as a match only when
/// its confidence clears the inclusion threshold.
pub fn score_pair(
    candidate: &CandidatePerson,
    existing: &Person,
    config: &DetectionConfig,
) -> Option<DuplicateMatch> {
    let mut name_result = score_names(&candidate.name, &existing.name);
    let relationship_result = score_relationship(candidate, existing);

    let mut confidence = (name_result.similarity + relationship_result.similarity).min(1.0);

    let candidate_father = candidate.father_name.as_deref().unwrap_or_default().trim();
    let existing_father = existing.father_name.as_deref().unwrap_or_default().trim();

    match compare_fathers(candidate, existing) {
        FatherComparison::ClearlyDifferent => {
            if name_result.similarity > NAME_SIMILARITY_THRESHOLD {
                confidence = DIFFERENT_FATHERS_STRONG.apply(confidence);
                name_result.reasons.push(format!(
                    "Strong evidence of different people: different fathers ({} ≠ {})",
                    candidate_father, existing_father
                ));
            } else if name_result.similarity > MODERATE_NAME_SIMILARITY {
                confidence = DIFFERENT_FATHERS_MODERATE.apply(confidence);
                name_result.reasons.push(format!(
                    "Different fathers suggest different people: {} vs {}",
                    candidate_father, existing_father
                ));
            }
        }
        FatherComparison::SpellingVariation => {
            confidence = FATHER_SPELLING_VARIATION.apply(confidence);
            name_result.reasons.push(format!(
                "Similar but different father names: {} vs {} (possible spelling variation)",
                candidate_father, existing_father
            ));
        }
        FatherComparison::Same | FatherComparison::Unknown => {}
    }

    debug!(
        "Scored '{}' against '{}' ({}): name={:.3}, relationship={:.3}, confidence={:.3}",
        candidate.name,
        existing.name,
        existing.id,
        name_result.similarity,
        relationship_result.similarity,
        confidence
    );

    if confidence <= config.inclusion_threshold {
        return None;
    }

    let mut reasons = name_result.reasons;
    reasons.extend(relationship_result.reasons);
    if reasons.is_empty() {
        reasons.push(format!(
            "Partially similar name ({}% match)",
            (name_result.similarity * 100.0).round() as u32
        ));
    }

    Some(DuplicateMatch {
        person: existing.clone(),
        confidence,
        reasons,
    })
}

/// Checks a candidate against the existing people with the default policy.
pub fn detect_duplicates(candidate: &CandidatePerson, existing_people: &[Person]) -> DuplicateDetectionResult {
    detect_duplicates_with_config(candidate, existing_people, &DetectionConfig::default())
}

pub fn detect_duplicates_with_config(
    candidate: &CandidatePerson,
    existing_people: &[Person],
    config: &DetectionConfig,
) -> DuplicateDetectionResult {
    if existing_people.is_empty() {
        return DuplicateDetectionResult::no_duplicates();
    }

    let mut matches: Vec<DuplicateMatch> = existing_people
        .iter()
        .filter_map(|person| score_pair(candidate, person, config))
        .collect();

    // stable: equal confidences keep input order
    matches.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let suggested_action = matches
        .first()
        .map(|top| suggested_action_for(top.confidence, config))
        .unwrap_or(SuggestedAction::Proceed);
    let is_duplicate = !matches.is_empty();
    matches.truncate(config.max_matches());

    DuplicateDetectionResult {
        is_duplicate,
        matches,
        suggested_action,
    }
}
