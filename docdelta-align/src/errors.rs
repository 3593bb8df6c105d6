//! Error types for alignment.

use docdelta::Side;
use thiserror::Error;

use crate::CorrespondenceKind;

/// A correspondence set that does not partition both unit sequences.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlignError {
    /// A unit is covered zero times or more than once.
    #[error("{side} unit {ordinal} appears in {occurrences} correspondences (expected exactly one)")]
    PartitionViolation {
        side: Side,
        ordinal: usize,
        occurrences: usize,
    },

    /// A correspondence refers to a unit past the end of its document.
    #[error("{side} unit {ordinal} is out of range ({len} units)")]
    OutOfRange {
        side: Side,
        ordinal: usize,
        len: usize,
    },

    /// Unit counts do not fit the correspondence kind.
    #[error("{kind:?} correspondence #{index} has {reference} reference and {client} client units")]
    Malformed {
        index: usize,
        kind: CorrespondenceKind,
        reference: usize,
        client: usize,
    },
}
