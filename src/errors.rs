//! Error types for document normalization.

use thiserror::Error;

use crate::Side;

/// Errors that can occur while normalizing a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// No structural unit survived normalization.
    #[error("{side} document contains no structural units")]
    EmptyDocument { side: Side },
}
