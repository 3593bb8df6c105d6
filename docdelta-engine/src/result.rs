//! Caller-facing response shape.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use docdelta::UnitId;
use docdelta_classify::Severity;
use docdelta_diff::ChangeType;
use serde::{Deserialize, Serialize};

/// The enriched record of one change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// `chg_` + 24 hex chars, reproducible for the same document pair
    pub id: String,
    pub change_type: ChangeType,
    pub original_text: String,
    pub modified_text: String,
    pub highlighted_original: String,
    pub highlighted_modified: String,
    pub llm_comment: String,
    pub required_services: Vec<String>,
    pub severity: Severity,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

/// Where a result came from. Kept alongside the response, never serialized with it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTrace {
    pub id: String,
    pub reference_unit_ids: Vec<UnitId>,
    pub client_unit_ids: Vec<UnitId>,
    /// The language model was not consulted; severity comes from the rule table
    pub degraded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPair {
    pub reference_doc: String,
    pub client_doc: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_changes: usize,
    pub critical_changes: usize,
    /// Seconds with two decimals, e.g. `"1.23s"`
    pub processing_time: String,
    pub document_pair: DocumentPair,
    pub analysis_id: String,
    pub by_change_type: BTreeMap<String, usize>,
    pub by_severity: BTreeMap<String, usize>,
}

impl Summary {
    pub fn new(
        results: &[AnalysisResult],
        document_pair: DocumentPair,
        analysis_id: String,
        elapsed: Duration,
    ) -> Self {
        let mut by_change_type = BTreeMap::new();
        let mut by_severity: BTreeMap<String, usize> = Severity::ALL
            .iter()
            .map(|s| (s.as_str().to_string(), 0))
            .collect();
        for result in results {
            *by_change_type
                .entry(result.change_type.as_str().to_string())
                .or_insert(0) += 1;
            *by_severity
                .entry(result.severity.as_str().to_string())
                .or_insert(0) += 1;
        }

        Self {
            total_changes: results.len(),
            critical_changes: results
                .iter()
                .filter(|r| r.severity == Severity::Critical)
                .count(),
            processing_time: format_seconds(elapsed),
            document_pair,
            analysis_id,
            by_change_type,
            by_severity,
        }
    }
}

pub(crate) fn format_seconds(elapsed: Duration) -> String {
    format!("{:.2}s", elapsed.as_secs_f64())
}

/// Ordered results plus summary of one comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub results: Vec<AnalysisResult>,
    pub summary: Summary,
    #[serde(skip)]
    pub traces: Vec<ResultTrace>,
}

impl AnalysisResponse {
    pub fn trace(&self, id: &str) -> Option<&ResultTrace> {
        self.traces.iter().find(|trace| trace.id == id)
    }

    pub fn degraded(&self) -> usize {
        self.traces.iter().filter(|trace| trace.degraded).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processing_time_format() {
        assert_eq!(format_seconds(Duration::from_millis(1234)), "1.23s");
        assert_eq!(format_seconds(Duration::ZERO), "0.00s");
    }

    #[test]
    fn empty_summary_lists_every_severity() {
        let summary = Summary::new(
            &[],
            DocumentPair {
                reference_doc: "a.txt".to_string(),
                client_doc: "b.txt".to_string(),
            },
            "run_x".to_string(),
            Duration::from_millis(50),
        );
        insta::assert_snapshot!(serde_json::to_string(&summary).unwrap(), @r###"{"totalChanges":0,"criticalChanges":0,"processingTime":"0.05s","documentPair":{"referenceDoc":"a.txt","clientDoc":"b.txt"},"analysisId":"run_x","byChangeType":{},"bySeverity":{"critical":0,"high":0,"low":0,"medium":0}}"###);
    }

    #[test]
    fn result_serializes_only_the_record_fields() {
        let result = AnalysisResult {
            id: "chg_1".to_string(),
            change_type: ChangeType::Modification,
            original_text: "Payment due in 30 days.".to_string(),
            modified_text: "Payment due in 45 days.".to_string(),
            highlighted_original: "Payment due in [-]30[/-] days.".to_string(),
            highlighted_modified: "Payment due in [+]45[/+] days.".to_string(),
            llm_comment: "Term changed.".to_string(),
            required_services: vec!["ФС".to_string()],
            severity: Severity::Medium,
            confidence: 0.7,
            created_at: Utc::now(),
        };
        let response = AnalysisResponse {
            summary: Summary::new(
                std::slice::from_ref(&result),
                DocumentPair {
                    reference_doc: "a.txt".to_string(),
                    client_doc: "b.txt".to_string(),
                },
                "run_x".to_string(),
                Duration::ZERO,
            ),
            results: vec![result],
            traces: vec![ResultTrace {
                id: "chg_1".to_string(),
                reference_unit_ids: Vec::new(),
                client_unit_ids: Vec::new(),
                degraded: true,
            }],
        };

        let json = serde_json::to_value(&response).unwrap();
        let top: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(top, ["results", "summary"]);

        let mut keys: Vec<&str> = json["results"][0]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            [
                "changeType",
                "confidence",
                "createdAt",
                "highlightedModified",
                "highlightedOriginal",
                "id",
                "llmComment",
                "modifiedText",
                "originalText",
                "requiredServices",
                "severity",
            ]
        );
        assert_eq!(response.degraded(), 1);
        assert!(response.trace("chg_1").is_some());
    }
}
