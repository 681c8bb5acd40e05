// src/errors.rs
use thiserror::Error;

use crate::models::DuplicateDetectionResult;

/// Errors surfaced by the write path. Scoring itself never fails.
#[derive(Debug, Error)]
pub enum DedupeError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("A very similar person already exists: {name} ({confidence_percent}% match)")]
    DuplicateBlocked {
        name: String,
        confidence_percent: u32,
    },

    /// Not a failure: the caller must show the result to a human and, if
    /// confirmed, resubmit through the override path.
    #[error("Possible duplicate needs confirmation before adding")]
    DuplicateNeedsReview(Box<DuplicateDetectionResult>),

    #[error("You must be signed in to change the family tree")]
    AuthRequired,

    #[error("Only an administrator can perform this action")]
    AdminRequired,

    #[error("Person not found: {0}")]
    PersonNotFound(String),

    #[error("Store unavailable: {0:#}")]
    StoreUnavailable(#[from] anyhow::Error),
}

impl DedupeError {
    /// True for outcomes that ask for user action rather than signal a fault.
    pub fn is_control_flow(&self) -> bool {
        matches!(self, DedupeError::DuplicateNeedsReview(_))
    }

    /// The detection result carried by a review request, if any.
    pub fn review_result(&self) -> Option<&DuplicateDetectionResult> {
        match self {
            DedupeError::DuplicateNeedsReview(result) => Some(result),
            _ => None,
        }
    }
}
