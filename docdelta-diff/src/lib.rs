//! Change extraction.
//!
//! [`ChangeExtractor`] turns one [`Correspondence`](docdelta_align::Correspondence) into zero
//! or more [`ChangeCandidate`]s:
//!
//! - `matched` / `split` / `merged`: a token LCS between the joined reference text and the
//!   joined client text; non-matching runs close to each other are grouped into one hunk,
//!   and each hunk becomes one candidate (`addition`, `deletion` or `modification`).
//! - `inserted` / `deleted`: a single whole-unit candidate.
//!
//! Tokens compare on punctuation-folded keys, so a curly quote replaced by a straight one
//! never produces a change.
//!
//! ```
//! use docdelta::{DocumentNormalizer, ExtractedText, Side};
//! use docdelta_align::StructuralAligner;
//! use docdelta_diff::{ChangeExtractor, ChangeType};
//!
//! let normalizer = DocumentNormalizer::new();
//! let reference = normalizer
//!     .normalize(Side::Reference, &ExtractedText::plain("Payment due in 30 days"))
//!     .unwrap();
//! let client = normalizer
//!     .normalize(Side::Client, &ExtractedText::plain("Payment due in 45 days"))
//!     .unwrap();
//! let alignment = StructuralAligner::new().align(&reference.units, &client.units);
//!
//! let changes = ChangeExtractor::new().extract(
//!     &alignment.correspondences[0],
//!     &reference.units,
//!     &client.units,
//! );
//! assert_eq!(changes.len(), 1);
//! assert_eq!(changes[0].change_type, ChangeType::Modification);
//! assert_eq!(changes[0].highlighted_original, "Payment due in [-]30[/-] days");
//! assert_eq!(changes[0].highlighted_modified, "Payment due in [+]45[/+] days");
//! ```

mod extract;
pub mod highlight;
mod hunk;
mod lcs;

pub use extract::{ChangeCandidate, ChangeExtractor, ChangeType, DiffConfig, EditSpan};
pub use hunk::{group_hunks, Hunk};
pub use lcs::{diff_tokens, DiffOp};
