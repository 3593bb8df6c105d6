//! Error types for rule tables and model reviews.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while loading a rule table.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("failed to read rule table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse rule table: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("keyword predicate has no keywords")]
    EmptyKeywords,

    #[error("duplicate rule name: {0}")]
    DuplicateRule(String),

    #[error("rule {rule} routes to {service}, which is not in the service catalog")]
    UnknownService { rule: String, service: String },
}

/// Errors from one language-model review.
///
/// None of these abort a run: the classifier degrades the affected change instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReviewError {
    #[error("no language model is configured")]
    Unavailable,

    #[error("language model did not answer within {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("rate limited by the language model service")]
    RateLimited,

    #[error("language model service returned {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("malformed model response: {0}")]
    Malformed(String),
}

impl ReviewError {
    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ReviewError::Timeout(_) | ReviewError::Transport(_) | ReviewError::RateLimited => true,
            ReviewError::BadStatus { status, .. } => *status >= 500,
            ReviewError::Unavailable | ReviewError::Malformed(_) => false,
        }
    }
}

impl From<reqwest::Error> for ReviewError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ReviewError::Malformed(err.to_string())
        } else {
            ReviewError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(ReviewError::RateLimited.is_retryable());
        assert!(ReviewError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(ReviewError::BadStatus {
            status: 503,
            body: String::new()
        }
        .is_retryable());
        assert!(!ReviewError::BadStatus {
            status: 401,
            body: String::new()
        }
        .is_retryable());
        assert!(!ReviewError::Malformed("empty".into()).is_retryable());
        assert!(!ReviewError::Unavailable.is_retryable());
    }
}
