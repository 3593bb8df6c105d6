//! Severity and approval routing for change candidates.
//!
//! [`SeverityClassifier`] runs in two layers:
//!
//! 1. A [`RuleTable`] of ordered `(predicate, severity floor, services)` rules checks
//!    deterministic signals: changed numbers and amounts, legal keywords, whole-clause
//!    deletions. The highest floor among the rules that fire is the minimum severity.
//! 2. An optional [`ChangeReviewer`] (a language model) writes the rationale, may raise the
//!    severity and suggests further services. Calls are bounded by a [`RetryPolicy`]; when
//!    the reviewer is missing or fails, the change degrades to the rule outcome with a low
//!    confidence instead of failing.
//!
//! ```
//! use std::sync::Arc;
//! use docdelta::{DocumentNormalizer, ExtractedText, Side};
//! use docdelta_align::StructuralAligner;
//! use docdelta_classify::{ClassificationContext, ClassifierConfig, RuleTable, Severity, SeverityClassifier};
//! use docdelta_diff::ChangeExtractor;
//!
//! let normalizer = DocumentNormalizer::new();
//! let reference = normalizer
//!     .normalize(Side::Reference, &ExtractedText::plain("The fee is $1,000 per month."))
//!     .unwrap();
//! let client = normalizer
//!     .normalize(Side::Client, &ExtractedText::plain("The fee is $800 per month."))
//!     .unwrap();
//! let alignment = StructuralAligner::new().align(&reference.units, &client.units);
//! let candidate = ChangeExtractor::new()
//!     .extract(&alignment.correspondences[0], &reference.units, &client.units)
//!     .remove(0);
//!
//! let rules = Arc::new(RuleTable::builtin().unwrap());
//! let classifier = SeverityClassifier::new(rules, ClassifierConfig::default());
//! let context = ClassificationContext::for_candidate(&candidate, &reference.units, &client.units);
//! let classification = block_on(classifier.classify(&candidate, &context));
//!
//! assert_eq!(classification.severity.value, Severity::High);
//! assert_eq!(classification.required_services, vec!["ФС".to_string()]);
//! assert!(classification.is_degraded());
//! # fn block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

mod classifier;
mod context;
mod errors;
pub mod openai;
pub mod predicate;
mod retry;
pub mod reviewer;
mod rules;
mod scored;
mod severity;

pub use classifier::{Classification, ClassifierConfig, SeverityClassifier};
pub use context::ClassificationContext;
pub use errors::{ReviewError, RuleError};
pub use openai::{ModelConfig, OpenAiReviewer};
pub use predicate::Predicate;
pub use retry::RetryPolicy;
pub use reviewer::{ChangeReviewer, ModelJudgment, ReviewRequest};
pub use rules::{PredicateSpec, Rule, RuleHit, RuleTable, RuleVerdict, Service};
pub use scored::{ScoreSource, Scored};
pub use severity::{ParseSeverityError, Severity};

#[cfg(test)]
mod tests {
    mod classifier;
    mod reviewer;
    mod rules;

    use docdelta::{DocumentNormalizer, ExtractedText, Side, StructuralUnit};
    use docdelta_align::StructuralAligner;
    use docdelta_diff::{ChangeCandidate, ChangeExtractor};

    use crate::ClassificationContext;

    /// Both documents of a comparison with their candidates in reference order.
    pub(crate) struct Pair {
        pub reference: Vec<StructuralUnit>,
        pub client: Vec<StructuralUnit>,
        pub candidates: Vec<ChangeCandidate>,
    }

    impl Pair {
        pub fn context(&self, index: usize) -> ClassificationContext {
            ClassificationContext::for_candidate(&self.candidates[index], &self.reference, &self.client)
        }
    }

    pub(crate) fn compare(reference: &str, client: &str) -> Pair {
        let normalizer = DocumentNormalizer::new();
        let reference = normalizer
            .normalize(Side::Reference, &ExtractedText::plain(reference))
            .unwrap()
            .units;
        let client = normalizer
            .normalize(Side::Client, &ExtractedText::plain(client))
            .unwrap()
            .units;
        let alignment = StructuralAligner::new().align(&reference, &client);
        let extractor = ChangeExtractor::new();
        let candidates = alignment
            .in_reference_order()
            .into_iter()
            .flat_map(|corr| extractor.extract(corr, &reference, &client))
            .collect();
        Pair {
            reference,
            client,
            candidates,
        }
    }
}
