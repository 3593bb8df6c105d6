use std::collections::HashSet;
use std::sync::Arc;

use docdelta_diff::ChangeCandidate;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::retry::RetryPolicy;
use crate::reviewer::{ChangeReviewer, ModelJudgment, ReviewRequest};
use crate::rules::{RuleHit, RuleTable, RuleVerdict};
use crate::{ClassificationContext, ReviewError, Scored, Severity};

/// Tunables for [`SeverityClassifier`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Confidence reported when the model could not be consulted
    pub degraded_confidence: f64,
    pub retry: RetryPolicy,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            degraded_confidence: 0.3,
            retry: RetryPolicy::default(),
        }
    }
}

/// Severity, routing and rationale for one change.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Final severity, never below `rule_floor`
    pub severity: Scored<Severity>,
    pub rule_floor: Severity,
    /// Approval services, rule services first, deduplicated
    pub required_services: Vec<String>,
    /// Natural-language rationale
    pub comment: String,
    pub reasoning: Option<String>,
    pub rule_hits: Vec<RuleHit>,
}

impl Classification {
    pub fn confidence(&self) -> f64 {
        self.severity.confidence
    }

    /// True when the model was unavailable and only the rule table decided.
    pub fn is_degraded(&self) -> bool {
        self.severity.is_degraded()
    }
}

/// Combines the rule table with an optional language-model reviewer.
///
/// The rule table always runs and sets the severity floor. The reviewer, when present,
/// writes the rationale and may raise the severity. Any reviewer failure degrades the
/// single change to the rule-only outcome; `classify` itself never fails.
pub struct SeverityClassifier {
    rules: Arc<RuleTable>,
    reviewer: Option<Arc<dyn ChangeReviewer>>,
    config: ClassifierConfig,
}

impl SeverityClassifier {
    /// A rule-only classifier.
    pub fn new(rules: Arc<RuleTable>, config: ClassifierConfig) -> Self {
        Self {
            rules,
            reviewer: None,
            config,
        }
    }

    pub fn with_reviewer(mut self, reviewer: Arc<dyn ChangeReviewer>) -> Self {
        self.reviewer = Some(reviewer);
        self
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn has_reviewer(&self) -> bool {
        self.reviewer.is_some()
    }

    #[instrument(skip_all, fields(change = candidate.change_type.as_str(), seq = candidate.sequence))]
    pub async fn classify(
        &self,
        candidate: &ChangeCandidate,
        context: &ClassificationContext,
    ) -> Classification {
        let verdict = self.rules.evaluate(candidate, context);

        let outcome = match &self.reviewer {
            Some(reviewer) => {
                let request =
                    ReviewRequest::new(candidate, context, &verdict, self.rules.catalog());
                self.config
                    .retry
                    .review(reviewer.as_ref(), &request)
                    .await
                    .map(|judgment| (judgment, reviewer.model()))
            }
            None => Err(ReviewError::Unavailable),
        };

        match outcome {
            Ok((judgment, model)) => self.combine(verdict, judgment, model),
            Err(err) => {
                if err == ReviewError::Unavailable {
                    debug!("no reviewer configured, using rule table only");
                } else {
                    warn!(error = %err, floor = %verdict.floor, "classification degraded to rule table");
                }
                self.degrade(verdict, &err)
            }
        }
    }

    fn combine(&self, verdict: RuleVerdict, judgment: ModelJudgment, model: &str) -> Classification {
        let severity = judgment
            .severity
            .map_or(verdict.floor, |s| s.max(verdict.floor));

        let mut seen: HashSet<String> = verdict.services.iter().cloned().collect();
        let mut services = verdict.services;
        for service in judgment.services {
            if self.rules.accepts_service(&service) && seen.insert(service.clone()) {
                services.push(service);
            }
        }

        Classification {
            severity: Scored::model_review(severity, judgment.confidence, model),
            rule_floor: verdict.floor,
            required_services: services,
            comment: judgment.comment,
            reasoning: judgment.reasoning,
            rule_hits: verdict.hits,
        }
    }

    fn degrade(&self, verdict: RuleVerdict, err: &ReviewError) -> Classification {
        let comment = if verdict.hits.is_empty() {
            "Automatic review unavailable. No rule matched this change; manual review recommended."
                .to_string()
        } else {
            format!(
                "Automatic review unavailable. Assessed by rules: {}.",
                verdict.rule_names().join(", ")
            )
        };

        Classification {
            severity: Scored::degraded(verdict.floor, self.config.degraded_confidence, err.to_string()),
            rule_floor: verdict.floor,
            required_services: verdict.services,
            comment,
            reasoning: None,
            rule_hits: verdict.hits,
        }
    }
}
