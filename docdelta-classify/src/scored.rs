//! Values paired with a confidence score and the source of that score.
//!
//! A classification's severity is a [`Scored<Severity>`](crate::Severity): its confidence is
//! the language model's own estimate when the model answered, the configured degraded
//! confidence when it did not.

use std::fmt;

/// A value with a confidence in `0.0..=1.0`.
#[derive(Clone)]
pub struct Scored<T> {
    pub value: T,
    pub confidence: f64,
    pub source: ScoreSource,
}

/// Where a confidence came from.
#[derive(Clone, Debug, PartialEq)]
pub enum ScoreSource {
    /// Rule floor combined with a language-model review
    ModelReview {
        /// Model identifier (e.g. "gpt-4o-mini")
        model: String,
    },
    /// The model could not be consulted; rule-only fallback
    Degraded {
        /// Why the review failed
        reason: String,
    },
}

impl<T> Scored<T> {
    pub fn new(value: T, confidence: f64, source: ScoreSource) -> Self {
        Self {
            value,
            confidence: confidence.clamp(0.0, 1.0),
            source,
        }
    }

    pub fn model_review(value: T, confidence: f64, model: &str) -> Self {
        Self::new(
            value,
            confidence,
            ScoreSource::ModelReview {
                model: model.to_string(),
            },
        )
    }

    pub fn degraded(value: T, confidence: f64, reason: impl Into<String>) -> Self {
        Self::new(
            value,
            confidence,
            ScoreSource::Degraded {
                reason: reason.into(),
            },
        )
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.source, ScoreSource::Degraded { .. })
    }
}

impl<T: fmt::Debug> fmt::Debug for Scored<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Compact format for snapshot tests: Scored(High, conf: 0.85)
        write!(f, "Scored({:?}, conf: {:.2})", self.value, self.confidence)
    }
}

impl<T: PartialEq> PartialEq for Scored<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
            && (self.confidence - other.confidence).abs() < f64::EPSILON
            && self.source == other.source
    }
}
