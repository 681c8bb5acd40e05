// src/models/mod.rs
pub mod matching;
pub mod person;

pub use matching::{DuplicateDetectionResult, DuplicateMatch, SimilarityScore, SuggestedAction};
pub use person::{CandidatePerson, Person, PersonUpdate};
