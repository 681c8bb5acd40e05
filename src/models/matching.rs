// src/models/matching.rs
use serde::{Deserialize, Serialize};
use std::fmt;

use super::person::Person;

/// What the caller should do with a candidate after detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestedAction {
    Proceed,
    Review,
    Block,
}

impl SuggestedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestedAction::Proceed => "proceed",
            SuggestedAction::Review => "review",
            SuggestedAction::Block => "block",
        }
    }
}

impl fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A similarity value in [0, 1] together with the reasons that produced it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimilarityScore {
    pub similarity: f64,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateMatch {
    pub person: Person,
    pub confidence: f64,
    pub reasons: Vec<String>,
}

impl DuplicateMatch {
    pub fn confidence_percent(&self) -> u32 {
        (self.confidence * 100.0).round() as u32
    }

    /// One-line summary for prompts, e.g. `85% match - Possible nickname match`.
    pub fn describe(&self) -> String {
        let main_reason = self
            .reasons
            .first()
            .map(String::as_str)
            .unwrap_or("Similar information");
        format!("{}% match - {}", self.confidence_percent(), main_reason)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateDetectionResult {
    pub is_duplicate: bool,
    pub matches: Vec<DuplicateMatch>,
    pub suggested_action: SuggestedAction,
}

impl DuplicateDetectionResult {
    /// Result for a candidate that resembles nobody.
    pub fn no_duplicates() -> Self {
        Self {
            is_duplicate: false,
            matches: Vec::new(),
            suggested_action: SuggestedAction::Proceed,
        }
    }

    pub fn top_match(&self) -> Option<&DuplicateMatch> {
        self.matches.first()
    }
}
