//! Error taxonomy of a comparison run.

use std::fmt;
use std::time::Duration;

use docdelta::{NormalizeError, Side};
use docdelta_align::AlignError;
use docdelta_classify::RuleError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Run-fatal errors. Per-change classification failures never surface here; they degrade
/// the affected result instead.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("{side} document contains no structural units")]
    EmptyDocument { side: Side },

    #[error("unsupported format for {side} document: {mime}")]
    UnsupportedFormat { side: Side, mime: String },

    #[error("text extraction failed for {side} document: {message}")]
    ExtractionFailed { side: Side, message: String },

    #[error("{side} document is {size} bytes, the limit is {limit}")]
    DocumentTooLarge { side: Side, size: usize, limit: usize },

    #[error("analysis did not finish within {0:?}")]
    AnalysisTimeout(Duration),

    #[error("alignment is inconsistent: {0}")]
    Alignment(#[from] AlignError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Machine-readable error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    EmptyDocument,
    UnsupportedFormat,
    ExtractionFailed,
    DocumentTooLarge,
    AnalysisTimeout,
    AlignmentFailed,
    InvalidConfig,
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::EmptyDocument => "EMPTY_DOCUMENT",
            ErrorKind::UnsupportedFormat => "UNSUPPORTED_FORMAT",
            ErrorKind::ExtractionFailed => "EXTRACTION_FAILED",
            ErrorKind::DocumentTooLarge => "DOCUMENT_TOO_LARGE",
            ErrorKind::AnalysisTimeout => "ANALYSIS_TIMEOUT",
            ErrorKind::AlignmentFailed => "ALIGNMENT_FAILED",
            ErrorKind::InvalidConfig => "INVALID_CONFIG",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::EmptyDocument { .. } => ErrorKind::EmptyDocument,
            EngineError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            EngineError::ExtractionFailed { .. } => ErrorKind::ExtractionFailed,
            EngineError::DocumentTooLarge { .. } => ErrorKind::DocumentTooLarge,
            EngineError::AnalysisTimeout(_) => ErrorKind::AnalysisTimeout,
            EngineError::Alignment(_) => ErrorKind::AlignmentFailed,
            EngineError::Config(_) => ErrorKind::InvalidConfig,
            EngineError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// True for errors caused by the submitted documents (4xx-equivalent).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::EmptyDocument
                | ErrorKind::UnsupportedFormat
                | ErrorKind::ExtractionFailed
                | ErrorKind::DocumentTooLarge
        )
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

impl From<NormalizeError> for EngineError {
    fn from(err: NormalizeError) -> Self {
        match err {
            NormalizeError::EmptyDocument { side } => EngineError::EmptyDocument { side },
        }
    }
}

impl From<RuleError> for EngineError {
    fn from(err: RuleError) -> Self {
        EngineError::Config(err.to_string())
    }
}
