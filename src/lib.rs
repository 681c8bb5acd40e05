// src/lib.rs
pub mod auth;
pub mod errors;
pub mod matching;
pub mod models;
pub mod store;
pub mod tree;
pub mod utils;

pub use auth::{Caller, UserRole};
pub use errors::DedupeError;
pub use matching::{detect_duplicates, detect_duplicates_with_config};
pub use models::{
    CandidatePerson, DuplicateDetectionResult, DuplicateMatch, Person, PersonUpdate,
    SuggestedAction,
};
