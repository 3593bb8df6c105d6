//! The language-model boundary.
//!
//! A [`ChangeReviewer`] receives one change with its location and the regulations the rule
//! table matched, and answers with a [`ModelJudgment`]. The wire format is a block of
//! labeled lines:
//!
//! ```text
//! COMMENT: Payment term extended from 30 to 45 days.
//! SERVICES: ФС, ЮрУ
//! SEVERITY: high
//! CONFIDENCE: 0.8
//! REASONING: A longer term delays cash inflow.
//! ```
//!
//! Russian labels (`КОММЕНТАРИЙ`, `СОГЛАСОВАНИЯ`, `КРИТИЧНОСТЬ`, `УВЕРЕННОСТЬ`,
//! `ОБОСНОВАНИЕ`) are accepted as well.

use async_trait::async_trait;
use docdelta_diff::{ChangeCandidate, ChangeType};
use serde::{Deserialize, Serialize};

use crate::rules::{RuleHit, RuleVerdict, Service};
use crate::{ClassificationContext, ReviewError, Severity};

/// Confidence assumed when the model omits or garbles it.
pub const DEFAULT_MODEL_CONFIDENCE: f64 = 0.5;

/// Everything a reviewer needs to judge one change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub original_text: String,
    pub modified_text: String,
    pub removed_text: String,
    pub added_text: String,
    pub change_type: ChangeType,
    pub context: ClassificationContext,
    /// Minimum severity the rule table assigned
    pub rule_floor: Severity,
    /// Rules that fired, used as regulation context
    pub regulations: Vec<RuleHit>,
    /// Services the model may route to (empty: unrestricted)
    pub services: Vec<Service>,
}

impl ReviewRequest {
    pub fn new(
        candidate: &ChangeCandidate,
        context: &ClassificationContext,
        verdict: &RuleVerdict,
        services: &[Service],
    ) -> Self {
        Self {
            original_text: candidate.original_text.clone(),
            modified_text: candidate.modified_text.clone(),
            removed_text: candidate.removed_text(),
            added_text: candidate.added_text(),
            change_type: candidate.change_type,
            context: context.clone(),
            rule_floor: verdict.floor,
            regulations: verdict.hits.clone(),
            services: services.to_vec(),
        }
    }

    /// The user prompt sent to the model.
    pub fn prompt(&self) -> String {
        let mut prompt = String::from(
            "Analyze a change between the reference version of a contract and the client's \
             edited version, and decide which internal approvals it requires.\n\n",
        );

        prompt.push_str("REFERENCE TEXT:\n");
        prompt.push_str(or_placeholder(&self.original_text, "(none: the clause was added)"));
        prompt.push_str("\n\nCLIENT VERSION:\n");
        prompt.push_str(or_placeholder(&self.modified_text, "(none: the clause was removed)"));

        prompt.push_str(&format!(
            "\n\nCHANGE: {}; removed: \"{}\"; added: \"{}\"\nLOCATION: {}\n\n",
            self.change_type.as_str(),
            self.removed_text,
            self.added_text,
            self.context.describe()
        ));

        prompt.push_str("RELEVANT REGULATIONS:\n");
        if self.regulations.is_empty() {
            prompt.push_str("No matching regulations.\n");
        }
        for hit in &self.regulations {
            match &hit.description {
                Some(description) => prompt.push_str(&format!("- {}: {}\n", hit.rule, description)),
                None => prompt.push_str(&format!("- {}\n", hit.rule)),
            }
        }

        prompt.push_str(&format!(
            "\nThe rule-based minimum severity is {}. You may raise it but not lower it.\n\n",
            self.rule_floor
        ));

        prompt.push_str(
            "Answer in exactly this format, one field per line, in the language of the document:\n\
             COMMENT: short description of the change and its consequences\n",
        );
        if self.services.is_empty() {
            prompt.push_str("SERVICES: comma-separated list of the departments that must approve\n");
        } else {
            prompt.push_str("SERVICES: comma-separated service codes, only from this list:\n");
            for service in &self.services {
                prompt.push_str(&format!("  {} - {}\n", service.code, service.name));
            }
        }
        prompt.push_str(
            "SEVERITY: low/medium/high/critical\n\
             CONFIDENCE: number from 0 to 1\n\
             REASONING: what must be checked and why\n",
        );
        prompt
    }
}

fn or_placeholder<'a>(text: &'a str, placeholder: &'a str) -> &'a str {
    if text.is_empty() {
        placeholder
    } else {
        text
    }
}

/// A model's answer for one change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelJudgment {
    pub comment: String,
    pub reasoning: Option<String>,
    /// `None` when the model's severity was missing or not one of the four levels
    pub severity: Option<Severity>,
    pub confidence: f64,
    pub services: Vec<String>,
}

/// Capability to review a change with a language model.
#[async_trait]
pub trait ChangeReviewer: Send + Sync {
    /// Model identifier recorded as the score source.
    fn model(&self) -> &str;

    async fn review(&self, request: &ReviewRequest) -> Result<ModelJudgment, ReviewError>;
}

#[derive(Clone, Copy, PartialEq)]
enum Field {
    Comment,
    Services,
    Severity,
    Confidence,
    Reasoning,
}

fn field_of(label: &str) -> Option<Field> {
    match label.trim().to_uppercase().as_str() {
        "COMMENT" | "КОММЕНТАРИЙ" => Some(Field::Comment),
        "SERVICES" | "СОГЛАСОВАНИЯ" => Some(Field::Services),
        "SEVERITY" | "КРИТИЧНОСТЬ" => Some(Field::Severity),
        "CONFIDENCE" | "УВЕРЕННОСТЬ" => Some(Field::Confidence),
        "REASONING" | "ОБОСНОВАНИЕ" => Some(Field::Reasoning),
        _ => None,
    }
}

/// Parse a labeled-line answer.
///
/// Lenient about markdown decoration (`**COMMENT:**`, `- SEVERITY:`) and brackets around
/// values. Unlabeled lines continue the preceding comment or reasoning. Fails only when
/// neither a comment nor a reasoning is present.
pub fn parse_labeled(content: &str) -> Result<ModelJudgment, ReviewError> {
    let mut comment: Option<String> = None;
    let mut reasoning: Option<String> = None;
    let mut severity = None;
    let mut confidence = None;
    let mut services = Vec::new();
    let mut current: Option<Field> = None;

    for line in content.lines() {
        let line = line
            .trim()
            .trim_start_matches(|c: char| matches!(c, '*' | '#' | '-' | '>'))
            .trim();
        if line.is_empty() {
            continue;
        }

        let labeled = line
            .split_once(':')
            .and_then(|(label, value)| field_of(label.trim_matches('*')).map(|f| (f, value)));

        let Some((field, value)) = labeled else {
            let target = match current {
                Some(Field::Comment) => &mut comment,
                Some(Field::Reasoning) => &mut reasoning,
                _ => continue,
            };
            if let Some(text) = target.as_mut() {
                text.push(' ');
                text.push_str(line);
            }
            continue;
        };

        let value = value.trim().trim_start_matches('*').trim();
        let bare = value.trim_matches(|c: char| matches!(c, '[' | ']')).trim();
        current = Some(field);
        match field {
            Field::Comment => comment = Some(bare.to_string()),
            Field::Reasoning => reasoning = Some(bare.to_string()),
            Field::Severity => severity = bare.parse::<Severity>().ok(),
            Field::Confidence => {
                confidence = bare
                    .replace(',', ".")
                    .parse::<f64>()
                    .ok()
                    .filter(|c| c.is_finite())
            }
            Field::Services => {
                services = bare
                    .split([',', ';'])
                    .map(|s| s.trim().trim_matches(|c: char| matches!(c, '[' | ']' | '.')))
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            }
        }
    }

    let comment = comment.filter(|c| !c.is_empty());
    let reasoning = reasoning.filter(|r| !r.is_empty());
    let comment = match (comment, &reasoning) {
        (Some(comment), _) => comment,
        (None, Some(reasoning)) => reasoning.clone(),
        (None, None) => {
            return Err(ReviewError::Malformed(
                "response has neither a comment nor a reasoning".to_string(),
            ))
        }
    };

    Ok(ModelJudgment {
        comment,
        reasoning,
        severity,
        confidence: confidence
            .unwrap_or(DEFAULT_MODEL_CONFIDENCE)
            .clamp(0.0, 1.0),
        services,
    })
}
