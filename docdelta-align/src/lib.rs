//! Structural alignment of two clause sequences.
//!
//! [`StructuralAligner`] partitions the units of a reference and a client document into
//! [`Correspondence`]s: `matched` (1:1), `split` (1:n), `merged` (n:1), `inserted` and
//! `deleted`. Matching works on clause content, never on clause labels, so renumbered or
//! reflowed documents still align unit by unit.
//!
//! ## Passes
//!
//! 1. **Anchors**: identical normalized text pairs up cheaply.
//! 2. **Candidates**: remaining units are scored against client units in a window around
//!    the position projected from the nearest anchor (or the whole region between anchors
//!    when none is near). The score mixes shingle Jaccard overlap with token edit distance.
//! 3. **Greedy acceptance**: best pairs first. A pair that is not a strong match is first
//!    checked against runs of adjacent units (`split` / `merged`).
//! 4. **Leftovers** become `inserted` / `deleted`.
//!
//! ```
//! use docdelta::{DocumentNormalizer, ExtractedText, Side};
//! use docdelta_align::{CorrespondenceKind, StructuralAligner};
//!
//! let normalizer = DocumentNormalizer::new();
//! let reference = normalizer
//!     .normalize(Side::Reference, &ExtractedText::plain("Payment due in 30 days."))
//!     .unwrap();
//! let client = normalizer
//!     .normalize(Side::Client, &ExtractedText::plain("Payment due in 45 days."))
//!     .unwrap();
//!
//! let alignment = StructuralAligner::new().align(&reference.units, &client.units);
//! assert_eq!(alignment.correspondences.len(), 1);
//! assert_eq!(alignment.correspondences[0].kind, CorrespondenceKind::Matched);
//! ```

mod aligner;
mod config;
mod correspondence;
mod errors;
mod similarity;

pub use aligner::StructuralAligner;
pub use config::AlignerConfig;
pub use correspondence::{Alignment, AlignmentStats, Correspondence, CorrespondenceKind};
pub use errors::AlignError;
pub use similarity::{similarity, UnitFeatures};

#[cfg(test)]
mod tests {
    mod aligner;
    mod partition;
}
