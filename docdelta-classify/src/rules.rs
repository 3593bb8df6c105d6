//! Rule table: ordered (predicate, severity floor, services) rules.
//!
//! Tables are written in TOML:
//!
//! ```toml
//! [[service]]
//! code = "ФС"
//! name = "Financial service"
//!
//! [[rule]]
//! name = "monetary-amount"
//! category = "financial"
//! floor = "high"
//! services = ["ФС"]
//! when = { type = "numeric_change", currency_only = true }
//! ```
//!
//! When a table declares a `[[service]]` catalog every rule must route to catalogued
//! services only, and model-suggested services are filtered against the same catalog.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use docdelta_diff::{ChangeCandidate, ChangeType};
use serde::{Deserialize, Serialize};

use crate::predicate::{
    AllOf, AnyOf, ChangeTypeIs, KeywordScope, Keywords, NumericChange, Predicate,
    SectionMatches, WholeUnit,
};
use crate::{ClassificationContext, RuleError, Severity};

const BUILTIN_RULES: &str = include_str!("default_rules.toml");

/// Serialized form of a [`Predicate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PredicateSpec {
    Keywords {
        keywords: Vec<String>,
        #[serde(default)]
        scope: KeywordScope,
    },
    NumericChange {
        #[serde(default)]
        currency_only: bool,
    },
    WholeUnit {
        change_type: ChangeType,
    },
    ChangeType {
        change_type: ChangeType,
    },
    Section {
        pattern: String,
    },
    All {
        predicates: Vec<PredicateSpec>,
    },
    Any {
        predicates: Vec<PredicateSpec>,
    },
}

impl PredicateSpec {
    pub fn build(&self) -> Result<Box<dyn Predicate>, RuleError> {
        let predicate: Box<dyn Predicate> = match self {
            PredicateSpec::Keywords { keywords, scope } => {
                Box::new(Keywords::new(keywords.as_slice(), *scope)?)
            }
            PredicateSpec::NumericChange { currency_only } => Box::new(NumericChange {
                currency_only: *currency_only,
            }),
            PredicateSpec::WholeUnit { change_type } => Box::new(WholeUnit {
                change_type: *change_type,
            }),
            PredicateSpec::ChangeType { change_type } => Box::new(ChangeTypeIs(*change_type)),
            PredicateSpec::Section { pattern } => Box::new(SectionMatches::new(pattern)?),
            PredicateSpec::All { predicates } => Box::new(AllOf(build_all(predicates)?)),
            PredicateSpec::Any { predicates } => Box::new(AnyOf(build_all(predicates)?)),
        };
        Ok(predicate)
    }
}

fn build_all(specs: &[PredicateSpec]) -> Result<Vec<Box<dyn Predicate>>, RuleError> {
    specs.iter().map(PredicateSpec::build).collect()
}

/// An approval body changes can be routed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Short code used in results, e.g. "ЮрУ"
    pub code: String,
    /// Human-readable name shown to the language model
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct RuleSpec {
    name: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    description: Option<String>,
    floor: Severity,
    #[serde(default)]
    services: Vec<String>,
    when: PredicateSpec,
}

#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(default, rename = "service")]
    services: Vec<Service>,
    #[serde(default, rename = "rule")]
    rules: Vec<RuleSpec>,
}

/// One rule: when the predicate matches, the change gets at least `floor` and is routed
/// to `services`.
#[derive(Debug)]
pub struct Rule {
    pub name: String,
    pub category: Option<String>,
    /// Regulation text handed to the language model as context
    pub description: Option<String>,
    pub floor: Severity,
    pub services: Vec<String>,
    predicate: Box<dyn Predicate>,
}

impl Rule {
    pub fn new(
        name: impl Into<String>,
        floor: Severity,
        services: Vec<String>,
        predicate: impl Predicate + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            category: None,
            description: None,
            floor,
            services,
            predicate: Box::new(predicate),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn matches(&self, candidate: &ChangeCandidate, context: &ClassificationContext) -> bool {
        self.predicate.evaluate(candidate, context)
    }
}

/// A rule that fired for a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleHit {
    pub rule: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub floor: Severity,
}

/// Combined outcome of every rule for one change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleVerdict {
    /// Highest floor among the rules that fired (`Low` when none did)
    pub floor: Severity,
    /// Services of the rules that fired, in table order, deduplicated
    pub services: Vec<String>,
    pub hits: Vec<RuleHit>,
}

impl RuleVerdict {
    pub fn rule_names(&self) -> Vec<String> {
        self.hits.iter().map(|h| h.rule.clone()).collect()
    }
}

/// Ordered rules plus the service catalog they route to.
#[derive(Debug, Default)]
pub struct RuleTable {
    rules: Vec<Rule>,
    catalog: Vec<Service>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The rules shipped with the crate.
    ///
    /// Covers legal, financial, insurance, credit, accounting and problem-asset clauses
    /// in English and Russian.
    pub fn builtin() -> Result<Self, RuleError> {
        Self::from_toml(BUILTIN_RULES)
    }

    pub fn from_toml(source: &str) -> Result<Self, RuleError> {
        let file: RuleFile = toml::from_str(source)?;
        let mut table = RuleTable {
            rules: Vec::with_capacity(file.rules.len()),
            catalog: file.services,
        };
        for spec in file.rules {
            table.push(Rule {
                predicate: spec.when.build()?,
                name: spec.name,
                category: spec.category,
                description: spec.description,
                floor: spec.floor,
                services: spec.services,
            })?;
        }
        Ok(table)
    }

    pub fn load(path: &Path) -> Result<Self, RuleError> {
        let source = fs::read_to_string(path).map_err(|source| RuleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&source)
    }

    /// Append a rule, checking its name is unique and its services are catalogued.
    pub fn push(&mut self, rule: Rule) -> Result<(), RuleError> {
        if self.rules.iter().any(|r| r.name == rule.name) {
            return Err(RuleError::DuplicateRule(rule.name));
        }
        if !self.catalog.is_empty() {
            if let Some(unknown) = rule.services.iter().find(|s| !self.in_catalog(s)) {
                return Err(RuleError::UnknownService {
                    rule: rule.name.clone(),
                    service: unknown.clone(),
                });
            }
        }
        self.rules.push(rule);
        Ok(())
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn catalog(&self) -> &[Service] {
        &self.catalog
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// True when `service` may appear in results. An empty catalog accepts everything.
    pub fn accepts_service(&self, service: &str) -> bool {
        self.catalog.is_empty() || self.in_catalog(service)
    }

    fn in_catalog(&self, service: &str) -> bool {
        self.catalog.iter().any(|s| s.code == service)
    }

    pub fn evaluate(
        &self,
        candidate: &ChangeCandidate,
        context: &ClassificationContext,
    ) -> RuleVerdict {
        let mut verdict = RuleVerdict::default();
        let mut seen = HashSet::new();

        for rule in self.rules.iter().filter(|r| r.matches(candidate, context)) {
            verdict.floor = verdict.floor.max(rule.floor);
            for service in &rule.services {
                if seen.insert(service.as_str()) {
                    verdict.services.push(service.clone());
                }
            }
            verdict.hits.push(RuleHit {
                rule: rule.name.clone(),
                category: rule.category.clone(),
                description: rule.description.clone(),
                floor: rule.floor,
            });
        }

        verdict
    }
}
