// src/utils/detection_config.rs
//! Tunable thresholds for the duplicate decision policy.
//! Defaults reproduce the behaviour the family tree has always had.

use log::{debug, info, warn};
use std::env;

pub const DEFAULT_INCLUSION_THRESHOLD: f64 = 0.3;
pub const DEFAULT_REVIEW_THRESHOLD: f64 = 0.8;
pub const DEFAULT_BLOCK_THRESHOLD: f64 = 0.9;
/// Results carry at most the single best match.
pub const MAX_MATCHES: usize = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    /// A pair is recorded as a match only when its confidence exceeds this.
    pub inclusion_threshold: f64,
    /// Top confidence at or above this asks for human review.
    pub review_threshold: f64,
    /// Top confidence at or above this blocks the write.
    pub block_threshold: f64,
    /// How many ranked matches the result keeps. Always `MAX_MATCHES`
    /// outside of tests.
    pub(crate) max_matches: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            inclusion_threshold: DEFAULT_INCLUSION_THRESHOLD,
            review_threshold: DEFAULT_REVIEW_THRESHOLD,
            block_threshold: DEFAULT_BLOCK_THRESHOLD,
            max_matches: MAX_MATCHES,
        }
    }
}

fn threshold_from_env(key: &str, default: f64) -> f64 {
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<f64>() {
            Ok(value) if (0.0..=1.0).contains(&value) => value,
            _ => {
                warn!("⚠️ Ignoring {}={:?}: expected a number in [0, 1], using {}", key, raw, default);
                default
            }
        },
        Err(_) => default,
    }
}

impl DetectionConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self {
            inclusion_threshold: threshold_from_env(
                "DEDUPE_INCLUSION_THRESHOLD",
                DEFAULT_INCLUSION_THRESHOLD,
            ),
            review_threshold: threshold_from_env("DEDUPE_REVIEW_THRESHOLD", DEFAULT_REVIEW_THRESHOLD),
            block_threshold: threshold_from_env("DEDUPE_BLOCK_THRESHOLD", DEFAULT_BLOCK_THRESHOLD),
            max_matches: MAX_MATCHES,
        };

        if config.review_threshold > config.block_threshold {
            warn!(
                "⚠️ Review threshold {} is above block threshold {}; using default thresholds",
                config.review_threshold, config.block_threshold
            );
            config.review_threshold = DEFAULT_REVIEW_THRESHOLD;
            config.block_threshold = DEFAULT_BLOCK_THRESHOLD;
        }

        debug!("Detection config: {:?}", config);
        config
    }

    pub fn max_matches(&self) -> usize {
        self.max_matches
    }

    /// Keeps more ranked matches, for inspecting the ordering.
    #[cfg(test)]
    pub(crate) fn with_max_matches(mut self, max_matches: usize) -> Self {
        self.max_matches = max_matches;
        self
    }

    /// Log the current configuration
    pub fn log_config(&self) {
        info!("👤 Duplicate detection thresholds:");
        info!("   Match inclusion: > {:.2}", self.inclusion_threshold);
        info!("   Review:          >= {:.2}", self.review_threshold);
        info!("   Block:           >= {:.2}", self.block_threshold);
        info!("   Matches kept:    {}", self.max_matches);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    // One test touches the process environment so the keys never race.
    #[test]
    fn test_config_from_env() {
        env::remove_var("DEDUPE_INCLUSION_THRESHOLD");
        env::remove_var("DEDUPE_REVIEW_THRESHOLD");
        env::remove_var("DEDUPE_BLOCK_THRESHOLD");
        assert_eq!(DetectionConfig::from_env(), DetectionConfig::default());

        env::set_var("DEDUPE_REVIEW_THRESHOLD", "0.75");
        env::set_var("DEDUPE_MAX_MATCHES", "3");
        let config = DetectionConfig::from_env();
        assert_eq!(config.review_threshold, 0.75);
        // the match limit is not configurable
        assert_eq!(config.max_matches(), MAX_MATCHES);
        assert_eq!(config.block_threshold, DEFAULT_BLOCK_THRESHOLD);

        env::set_var("DEDUPE_INCLUSION_THRESHOLD", "1.7");
        let config = DetectionConfig::from_env();
        assert_eq!(config.inclusion_threshold, DEFAULT_INCLUSION_THRESHOLD);

        env::set_var("DEDUPE_REVIEW_THRESHOLD", "0.95");
        let config = DetectionConfig::from_env();
        assert_eq!(config.review_threshold, DEFAULT_REVIEW_THRESHOLD);
        assert_eq!(config.block_threshold, DEFAULT_BLOCK_THRESHOLD);

        env::remove_var("DEDUPE_INCLUSION_THRESHOLD");
        env::remove_var("DEDUPE_REVIEW_THRESHOLD");
        env::remove_var("DEDUPE_MAX_MATCHES");
    }
}
