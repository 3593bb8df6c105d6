//! Deterministic signals evaluated against a change.
//!
//! Each rule of a [`RuleTable`](crate::RuleTable) owns one [`Predicate`]. Predicates are pure
//! functions of the candidate and its [`ClassificationContext`].

use std::fmt;
use std::str::FromStr;

use docdelta_diff::{ChangeCandidate, ChangeType};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ClassificationContext, RuleError};

static AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d+(?:[.,]\d+|[\u{00A0}\u{202F} ]\d{3}\b)*").expect("Invalid amount regex")
});

static CURRENCY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[$€£₽¥]|\b(?:usd|eur|gbp|rub|dollars?|euros?|руб\w*|долл\w*|евро)\b")
        .expect("Invalid currency regex")
});

/// A capability deciding whether a rule applies to a change.
pub trait Predicate: fmt::Debug + Send + Sync {
    fn evaluate(&self, candidate: &ChangeCandidate, context: &ClassificationContext) -> bool;
}

/// Which text a keyword predicate searches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordScope {
    /// Only the removed and added spans
    #[default]
    Changed,
    /// The whole original and modified texts
    Unit,
}

/// Matches when any keyword starts a word of the searched text.
///
/// Keywords are word prefixes, so `liabilit` covers "liability" and "liabilities" and
/// `штраф` covers every case form of the Russian noun.
#[derive(Debug)]
pub struct Keywords {
    pattern: Regex,
    scope: KeywordScope,
}

impl Keywords {
    pub fn new<S: AsRef<str>>(keywords: &[S], scope: KeywordScope) -> Result<Self, RuleError> {
        let alternatives: Vec<String> = keywords
            .iter()
            .map(|k| k.as_ref().trim())
            .filter(|k| !k.is_empty())
            .map(regex::escape)
            .collect();
        if alternatives.is_empty() {
            return Err(RuleError::EmptyKeywords);
        }
        let pattern = RegexBuilder::new(&format!(r"\b(?:{})", alternatives.join("|")))
            .case_insensitive(true)
            .build()?;
        Ok(Self { pattern, scope })
    }
}

impl Predicate for Keywords {
    fn evaluate(&self, candidate: &ChangeCandidate, _context: &ClassificationContext) -> bool {
        match self.scope {
            KeywordScope::Changed => {
                self.pattern.is_match(&candidate.removed_text())
                    || self.pattern.is_match(&candidate.added_text())
            }
            KeywordScope::Unit => {
                self.pattern.is_match(&candidate.original_text)
                    || self.pattern.is_match(&candidate.modified_text)
            }
        }
    }
}

/// Matches when the numbers in the removed spans differ from those in the added spans.
///
/// Numbers compare by value: `1,000.00` and `1000` are the same amount. With
/// `currency_only` the change must also sit in text that mentions a currency.
#[derive(Debug, Default)]
pub struct NumericChange {
    pub currency_only: bool,
}

impl Predicate for NumericChange {
    fn evaluate(&self, candidate: &ChangeCandidate, _context: &ClassificationContext) -> bool {
        if amounts(&candidate.removed_text()) == amounts(&candidate.added_text()) {
            return false;
        }
        !self.currency_only
            || CURRENCY.is_match(&candidate.original_text)
            || CURRENCY.is_match(&candidate.modified_text)
    }
}

/// Sorted numeric values found in `text`.
fn amounts(text: &str) -> Vec<Decimal> {
    let mut values: Vec<Decimal> = AMOUNT
        .find_iter(text)
        .filter_map(|m| parse_amount(m.as_str()))
        .collect();
    values.sort();
    values
}

/// Parse `1 000`, `1,000.50`, `1.000,50` and `12,5` style numbers.
fn parse_amount(raw: &str) -> Option<Decimal> {
    let compact: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '\u{00A0}' | '\u{202F}'))
        .collect();

    let last_dot = compact.rfind('.');
    let last_comma = compact.rfind(',');
    let canonical = match (last_dot, last_comma) {
        (Some(dot), Some(comma)) => {
            let (group, decimal) = if dot > comma { (',', '.') } else { ('.', ',') };
            compact.replace(group, "").replace(decimal, ".")
        }
        (Some(_), None) if compact.matches('.').count() > 1 => compact.replace('.', ""),
        (None, Some(comma)) => {
            let grouped = compact.matches(',').count() > 1 || compact.len() - comma - 1 == 3;
            if grouped {
                compact.replace(',', "")
            } else {
                compact.replace(',', ".")
            }
        }
        _ => compact,
    };
    Decimal::from_str(&canonical).ok().map(|d| d.normalize())
}

/// Matches a whole inserted or deleted unit of the given change type.
#[derive(Debug)]
pub struct WholeUnit {
    pub change_type: ChangeType,
}

impl Predicate for WholeUnit {
    fn evaluate(&self, candidate: &ChangeCandidate, _context: &ClassificationContext) -> bool {
        candidate.is_whole_unit() && candidate.change_type == self.change_type
    }
}

/// Matches any candidate of the given change type.
#[derive(Debug)]
pub struct ChangeTypeIs(pub ChangeType);

impl Predicate for ChangeTypeIs {
    fn evaluate(&self, candidate: &ChangeCandidate, _context: &ClassificationContext) -> bool {
        candidate.change_type == self.0
    }
}

/// Matches when the section heading or one of the clause labels matches a pattern.
#[derive(Debug)]
pub struct SectionMatches {
    pattern: Regex,
}

impl SectionMatches {
    pub fn new(pattern: &str) -> Result<Self, RuleError> {
        let pattern = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self { pattern })
    }
}

impl Predicate for SectionMatches {
    fn evaluate(&self, _candidate: &ChangeCandidate, context: &ClassificationContext) -> bool {
        context
            .section
            .iter()
            .chain(context.labels.iter())
            .any(|text| self.pattern.is_match(text))
    }
}

/// Matches when every inner predicate matches.
#[derive(Debug)]
pub struct AllOf(pub Vec<Box<dyn Predicate>>);

impl Predicate for AllOf {
    fn evaluate(&self, candidate: &ChangeCandidate, context: &ClassificationContext) -> bool {
        self.0.iter().all(|p| p.evaluate(candidate, context))
    }
}

/// Matches when any inner predicate matches.
#[derive(Debug)]
pub struct AnyOf(pub Vec<Box<dyn Predicate>>);

impl Predicate for AnyOf {
    fn evaluate(&self, candidate: &ChangeCandidate, context: &ClassificationContext) -> bool {
        self.0.iter().any(|p| p.evaluate(candidate, context))
    }
}
