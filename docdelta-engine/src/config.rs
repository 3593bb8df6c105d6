//! Engine configuration.
//!
//! Loaded once at startup from TOML. Every section is optional:
//!
//! ```toml
//! rules_path = "rules.toml"
//!
//! [aligner]
//! match_threshold = 0.55
//!
//! [classifier]
//! degraded_confidence = 0.3
//! retry = { attempts = 2, attempt_timeout_ms = 20000 }
//!
//! [model]
//! model = "gpt-4o-mini"
//!
//! [limits]
//! workers = 8
//! request_timeout_ms = 300000
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use docdelta::NormalizerConfig;
use docdelta_align::AlignerConfig;
use docdelta_classify::{ClassifierConfig, ModelConfig};
use docdelta_diff::DiffConfig;
use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Resource limits of one comparison request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Concurrent classifications (bounds outbound model calls)
    pub workers: usize,
    /// Wall-clock budget of a whole request
    pub request_timeout_ms: u64,
    /// Largest accepted document
    pub max_document_bytes: usize,
    /// Completed responses kept for repeated pairs (0 disables caching)
    pub cache_capacity: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            request_timeout_ms: 300_000,
            max_document_bytes: 10 * 1024 * 1024,
            cache_capacity: 64,
        }
    }
}

impl LimitsConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub normalizer: NormalizerConfig,
    pub aligner: AlignerConfig,
    pub diff: DiffConfig,
    pub classifier: ClassifierConfig,
    pub model: ModelConfig,
    pub limits: LimitsConfig,
    /// Rule table to load instead of the built-in one
    pub rules_path: Option<PathBuf>,
}

impl EngineConfig {
    pub fn from_toml(source: &str) -> Result<Self, EngineError> {
        let config: EngineConfig =
            toml::from_str(source).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let source = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_toml(&source)
    }

    /// Reject values that cannot work together.
    pub fn validate(&self) -> Result<(), EngineError> {
        let invalid = |message: String| Err(EngineError::Config(message));

        if self.limits.workers == 0 {
            return invalid("limits.workers must be at least 1".to_string());
        }
        if self.limits.max_document_bytes == 0 {
            return invalid("limits.max_document_bytes must be positive".to_string());
        }
        if self.classifier.retry.attempts == 0 {
            return invalid("classifier.retry.attempts must be at least 1".to_string());
        }
        // A hung model must fall back to the rule floor before the request runs out.
        let review_budget = self.classifier.retry.budget();
        if review_budget >= self.limits.request_timeout() {
            return invalid(format!(
                "classifier.retry allows {:?} per review ({} attempts of {} ms plus backoff), \
                 which must be shorter than limits.request_timeout_ms ({})",
                review_budget,
                self.classifier.retry.attempts,
                self.classifier.retry.attempt_timeout_ms,
                self.limits.request_timeout_ms
            ));
        }

        let unit_interval = [
            ("aligner.match_threshold", self.aligner.match_threshold),
            ("aligner.strong_match", self.aligner.strong_match),
            ("aligner.split_merge_part_min", self.aligner.split_merge_part_min),
            ("aligner.split_merge_accept", self.aligner.split_merge_accept),
            ("classifier.degraded_confidence", self.classifier.degraded_confidence),
        ];
        for (name, value) in unit_interval {
            if !(0.0..=1.0).contains(&value) {
                return invalid(format!("{} must be within 0..=1, got {}", name, value));
            }
        }
        if self.aligner.strong_match < self.aligner.match_threshold {
            return invalid("aligner.strong_match must not be below aligner.match_threshold".to_string());
        }
        if self.aligner.shingle_size == 0 {
            return invalid("aligner.shingle_size must be at least 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = EngineConfig::from_toml(
            r#"
            [limits]
            workers = 8

            [aligner]
            match_threshold = 0.55
            "#,
        )
        .unwrap();
        assert_eq!(config.limits.workers, 8);
        assert_eq!(config.limits.max_document_bytes, 10 * 1024 * 1024);
        assert_eq!(config.aligner.match_threshold, 0.55);
        assert_eq!(config.aligner.shingle_size, 2);
        assert_eq!(config.classifier.degraded_confidence, 0.3);
        assert_eq!(config.rules_path, None);
    }

    #[test]
    fn rejects_inconsistent_values() {
        let zero_workers = EngineConfig::from_toml("[limits]\nworkers = 0");
        assert!(matches!(zero_workers, Err(EngineError::Config(m)) if m.contains("workers")));

        let slow_model = EngineConfig::from_toml(
            "[limits]\nrequest_timeout_ms = 1000\n[classifier.retry]\nattempt_timeout_ms = 1000",
        );
        assert!(matches!(slow_model, Err(EngineError::Config(m)) if m.contains("shorter")));

        // Each attempt fits, all three plus backoff do not.
        let retries = EngineConfig::from_toml(
            "[limits]\nrequest_timeout_ms = 150000\n[classifier.retry]\nattempt_timeout_ms = 100000",
        );
        assert!(matches!(retries, Err(EngineError::Config(m)) if m.contains("3 attempts")));

        assert!(EngineConfig::default().validate().is_ok());

        let threshold = EngineConfig::from_toml("[aligner]\nmatch_threshold = 1.5");
        assert!(matches!(threshold, Err(EngineError::Config(m)) if m.contains("match_threshold")));

        assert!(EngineConfig::from_toml("[limits]\nworkers = \"many\"").is_err());
    }
}
