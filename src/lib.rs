//! Core document model for clause-level comparison.
//!
//! This crate turns the extracted text of one document into an ordered sequence of
//! [`StructuralUnit`]s, the addressable clauses and paragraphs every later stage works on.
//!
//! ## Modules
//!
//! - [`normalize`] - [`DocumentNormalizer`], splitting text into units and folding cosmetic noise
//! - [`label`] - clause label detection (`3.2`, `Section 4`, `(a)`, `ARTICLE IV`)
//! - [`token`] - word-boundary tokenizer with punctuation-folded comparison keys
//! - [`fingerprint`] - content hashes for documents and document pairs
//!
//! ## Example
//!
//! ```
//! use docdelta::{DocumentNormalizer, ExtractedText, Side};
//!
//! let text = "1. Payment due in 30 days.\n\n2. Either party may terminate.";
//! let doc = DocumentNormalizer::new()
//!     .normalize(Side::Reference, &ExtractedText::plain(text))
//!     .unwrap();
//!
//! assert_eq!(doc.units.len(), 2);
//! assert_eq!(doc.units[0].body_text, "Payment due in 30 days.");
//! assert_eq!(doc.units[0].clause_label.as_ref().unwrap().canonical, "1");
//! ```

mod errors;
pub mod fingerprint;
pub mod label;
pub mod normalize;
pub mod token;
mod unit;

pub use errors::NormalizeError;
pub use fingerprint::{ContentHash, PairFingerprint};
pub use label::{ClauseLabel, LabelKind};
pub use normalize::{
    DocumentNormalizer, ExtractedText, LayoutHints, NormalizedDocument, NormalizerConfig,
};
pub use token::{Token, TokenTag};
pub use unit::{DocumentStats, Language, Side, StructuralUnit, UnitId};
