// src/utils/logging.rs - Logging helpers for guarded writes
use log::{debug, info, warn};
use std::time::Instant;

use crate::models::{DuplicateDetectionResult, SuggestedAction};

#[derive(Clone)]
pub struct DetectionLogger {
    operation: &'static str,
    start_time: Instant,
}

impl DetectionLogger {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start_time: Instant::now(),
        }
    }

    fn elapsed_secs(&self) -> f32 {
        self.start_time.elapsed().as_secs_f32()
    }

    pub fn log_start(&self, candidate_name: &str) {
        info!(
            "[DEDUPE] 👤 🚀 {}: checking '{}' for duplicates",
            self.operation, candidate_name
        );
    }

    pub fn log_snapshot(&self, people_count: usize) {
        debug!(
            "[DEDUPE] 👤 📊 {}: comparing against {} existing people [+{:.3}s]",
            self.operation,
            people_count,
            self.elapsed_secs()
        );
    }

    pub fn log_verdict(&self, result: &DuplicateDetectionResult) {
        match result.top_match() {
            Some(top) => {
                let msg = format!(
                    "[DEDUPE] 👤 🎯 {}: verdict={} top='{}' ({}) [+{:.3}s]",
                    self.operation,
                    result.suggested_action,
                    top.person.name,
                    top.describe(),
                    self.elapsed_secs()
                );
                if result.suggested_action == SuggestedAction::Block {
                    warn!("{}", msg);
                } else {
                    info!("{}", msg);
                }
            }
            None => info!(
                "[DEDUPE] 👤 ✨ {}: no similar people found [+{:.3}s]",
                self.operation,
                self.elapsed_secs()
            ),
        }
    }

    pub fn log_retry(&self, attempt: u32, max_retries: u32) {
        warn!(
            "[DEDUPE] 👤 🔁 {}: transaction conflict, re-running detection (attempt {}/{})",
            self.operation, attempt, max_retries
        );
    }

    pub fn log_written(&self, person_id: &str, name: &str) {
        info!(
            "[DEDUPE] 👤 ✅ {}: stored '{}' as {} [+{:.3}s]",
            self.operation,
            name,
            person_id,
            self.elapsed_secs()
        );
    }

    pub fn log_override(&self, name: &str) {
        info!(
            "[DEDUPE] 👤 ⏭️  {}: '{}' confirmed by user, skipping duplicate detection",
            self.operation, name
        );
    }
}
