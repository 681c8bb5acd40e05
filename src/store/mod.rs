// src/store/mod.rs - Persistence boundary and the guarded write path
//!
//! Every store runs duplicate detection and the insert against the same
//! snapshot, indivisibly: the in-memory store under its mutex, PostgreSQL
//! inside a serializable transaction that is re-run on conflict.

pub mod cache;
pub mod memory;
pub mod postgres;

use std::future::Future;
use tokio::sync::watch;

use crate::auth::Caller;
use crate::errors::DedupeError;
use crate::matching::detect_duplicates_with_config;
use crate::models::{CandidatePerson, DuplicateDetectionResult, Person, PersonUpdate, SuggestedAction};
use crate::utils::detection_config::DetectionConfig;
use crate::utils::logging::DetectionLogger;

pub use cache::{CachedPeopleStore, LocalCache};
pub use memory::MemoryPeopleStore;
pub use postgres::PgPeopleStore;

pub trait PeopleStore: Send + Sync {
    fn detection_config(&self) -> &DetectionConfig;

    /// Every stored person, newest first.
    fn list_people(&self) -> impl Future<Output = Result<Vec<Person>, DedupeError>> + Send;

    /// Inserts the candidate unless detection over the same snapshot says
    /// block or review. Returns the new person's id.
    fn add_person_checked(
        &self,
        caller: &Caller,
        candidate: CandidatePerson,
    ) -> impl Future<Output = Result<String, DedupeError>> + Send;

    /// Inserts without detection, after a human confirmed a review prompt.
    fn add_person_with_override(
        &self,
        caller: &Caller,
        candidate: CandidatePerson,
    ) -> impl Future<Output = Result<String, DedupeError>> + Send;

    fn update_person(
        &self,
        caller: &Caller,
        id: &str,
        update: PersonUpdate,
    ) -> impl Future<Output = Result<(), DedupeError>> + Send;

    fn delete_person(
        &self,
        caller: &Caller,
        id: &str,
    ) -> impl Future<Output = Result<(), DedupeError>> + Send;

    /// Removes everyone. Returns how many people were deleted.
    fn clear_all(&self, caller: &Caller) -> impl Future<Output = Result<u64, DedupeError>> + Send;

    /// Detection over a plain, possibly stale read. For previews only: never
    /// write on the strength of this result.
    fn preview_duplicates(
        &self,
        candidate: &CandidatePerson,
    ) -> impl Future<Output = Result<DuplicateDetectionResult, DedupeError>> + Send {
        async move {
            let people = self.list_people().await?;
            Ok(detect_duplicates_with_config(
                candidate,
                &people,
                self.detection_config(),
            ))
        }
    }
}

/// Push-based view of the people list. Dropping the receiver unsubscribes.
pub trait PeopleFeed {
    fn subscribe(&self) -> watch::Receiver<Vec<Person>>;
}

/// Turns a detection verdict into the write decision.
pub fn enforce_verdict(result: DuplicateDetectionResult) -> Result<(), DedupeError> {
    match result.suggested_action {
        SuggestedAction::Proceed => Ok(()),
        SuggestedAction::Block => {
            let (name, confidence_percent) = result
                .top_match()
                .map(|m| (m.person.name.clone(), m.confidence_percent()))
                .unwrap_or_default();
            Err(DedupeError::DuplicateBlocked {
                name,
                confidence_percent,
            })
        }
        SuggestedAction::Review => Err(DedupeError::DuplicateNeedsReview(Box::new(result))),
    }
}

fn require_name(candidate: &CandidatePerson) -> Result<(), DedupeError> {
    if candidate.name.trim().is_empty() {
        return Err(DedupeError::InvalidInput(
            "person name must not be blank".to_string(),
        ));
    }
    Ok(())
}

/// Runs detection against `people` (the write's own snapshot) and returns
/// the candidate ready to insert, with its father link resolved.
pub(crate) fn guard_candidate(
    mut candidate: CandidatePerson,
    people: &[Person],
    config: &DetectionConfig,
    logger: &DetectionLogger,
) -> Result<CandidatePerson, DedupeError> {
    require_name(&candidate)?;
    logger.log_snapshot(people.len());
    let result = detect_duplicates_with_config(&candidate, people, config);
    logger.log_verdict(&result);
    enforce_verdict(result)?;
    candidate.resolve_father(people);
    Ok(candidate)
}

/// Override inserts skip detection but still validate and link the father.
pub(crate) fn prepare_override(
    mut candidate: CandidatePerson,
    people: &[Person],
) -> Result<CandidatePerson, DedupeError> {
    require_name(&candidate)?;
    candidate.resolve_father(people);
    Ok(candidate)
}

pub(crate) fn new_person_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DuplicateMatch;
    use chrono::Utc;

    fn person(id: &str, name: &str) -> Person {
        Person {
            id: id.to_string(),
            name: name.to_string(),
            father_name: None,
            father_id: None,
            created_at: Utc::now(),
        }
    }

    fn result_with(action: SuggestedAction, confidence: f64) -> DuplicateDetectionResult {
        DuplicateDetectionResult {
            is_duplicate: true,
            matches: vec![DuplicateMatch {
                person: person("1", "John Smith"),
                confidence,
                reasons: vec!["Exact name match".to_string()],
            }],
            suggested_action: action,
        }
    }

    #[test]
    fn test_block_carries_name_and_rounded_percent() {
        let err = enforce_verdict(result_with(SuggestedAction::Block, 0.9375)).unwrap_err();
        match err {
            DedupeError::DuplicateBlocked {
                name,
                confidence_percent,
            } => {
                assert_eq!(name, "John Smith");
                assert_eq!(confidence_percent, 94);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_review_carries_full_result() {
        let result = result_with(SuggestedAction::Review, 0.85);
        let err = enforce_verdict(result.clone()).unwrap_err();
        assert_eq!(err.review_result(), Some(&result));
    }

    #[test]
    fn test_proceed_passes() {
        assert!(enforce_verdict(DuplicateDetectionResult::no_duplicates()).is_ok());
        // a weak match still lets the write through
        assert!(enforce_verdict(result_with(SuggestedAction::Proceed, 0.5)).is_ok());
    }

    #[test]
    fn test_guard_resolves_father_after_detection() {
        let people = vec![person("f1", "Ali Amiri")];
        let logger = DetectionLogger::new("test");
        let candidate = CandidatePerson::named("Sara Amiri").with_father_name("Ali Amiri");
        let guarded = guard_candidate(candidate, &people, &DetectionConfig::default(), &logger).unwrap();
        assert_eq!(guarded.father_id.as_deref(), Some("f1"));
    }

    #[test]
    fn test_guard_rejects_blank_name() {
        let logger = DetectionLogger::new("test");
        let err = guard_candidate(
            CandidatePerson::named("  "),
            &[],
            &DetectionConfig::default(),
            &logger,
        )
        .unwrap_err();
        assert!(matches!(err, DedupeError::InvalidInput(_)));
        assert!(prepare_override(CandidatePerson::named(""), &[]).is_err());
    }
}
