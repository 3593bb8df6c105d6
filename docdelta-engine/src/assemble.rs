use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use docdelta::PairFingerprint;
use docdelta_classify::Classification;
use docdelta_diff::ChangeCandidate;
use sha2::{Digest, Sha256};

use crate::result::{AnalysisResponse, AnalysisResult, DocumentPair, ResultTrace, Summary};

const RESULT_ID_HEX: usize = 24;

/// A classified candidate plus the rank of its correspondence in reference-document order.
#[derive(Debug, Clone)]
pub struct ClassifiedChange {
    pub rank: usize,
    pub candidate: ChangeCandidate,
    pub classification: Classification,
}

/// Turns classified candidates into the response.
///
/// Classifications finish in any order; the assembler restores candidate order, derives the
/// stable ids and computes the summary.
#[derive(Debug, Clone)]
pub struct ResultAssembler {
    fingerprint: PairFingerprint,
    created_at: DateTime<Utc>,
}

impl ResultAssembler {
    pub fn new(fingerprint: PairFingerprint, created_at: DateTime<Utc>) -> Self {
        Self {
            fingerprint,
            created_at,
        }
    }

    /// `run_` + the first 24 hex chars of the pair fingerprint.
    pub fn analysis_id(&self) -> String {
        format!("run_{}", self.fingerprint.short(RESULT_ID_HEX))
    }

    /// Deterministic id from the pair fingerprint, the source unit ids and the candidate's
    /// sequence within its correspondence.
    pub fn result_id(&self, candidate: &ChangeCandidate) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.fingerprint.as_bytes());
        for id in candidate.reference_ids.iter().chain(&candidate.client_ids) {
            hasher.update(id.as_str().as_bytes());
            hasher.update([0u8]);
        }
        hasher.update((candidate.sequence as u64).to_be_bytes());
        let digest = hex::encode(hasher.finalize());
        format!("chg_{}", &digest[..RESULT_ID_HEX])
    }

    pub fn assemble(
        &self,
        mut changes: Vec<ClassifiedChange>,
        document_pair: DocumentPair,
        elapsed: Duration,
    ) -> AnalysisResponse {
        changes.sort_by_key(|c| (c.rank, c.candidate.sequence));

        let (results, traces): (Vec<AnalysisResult>, Vec<ResultTrace>) = changes
            .into_iter()
            .map(|change| self.result(change))
            .unzip();
        let summary = Summary::new(&results, document_pair, self.analysis_id(), elapsed);

        AnalysisResponse {
            results,
            summary,
            traces,
        }
    }

    fn result(&self, change: ClassifiedChange) -> (AnalysisResult, ResultTrace) {
        let ClassifiedChange {
            candidate,
            classification,
            ..
        } = change;

        let id = self.result_id(&candidate);
        let trace = ResultTrace {
            id: id.clone(),
            reference_unit_ids: candidate.reference_ids,
            client_unit_ids: candidate.client_ids,
            degraded: classification.is_degraded(),
        };
        let result = AnalysisResult {
            id,
            change_type: candidate.change_type,
            confidence: classification.confidence(),
            severity: classification.severity.value,
            required_services: dedup_services(classification.required_services),
            llm_comment: classification.comment,
            created_at: self.created_at,
            original_text: candidate.original_text,
            modified_text: candidate.modified_text,
            highlighted_original: candidate.highlighted_original,
            highlighted_modified: candidate.highlighted_modified,
        };
        (result, trace)
    }
}

fn dedup_services(services: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    services
        .into_iter()
        .filter(|s| seen.insert(s.clone()))
        .collect()
}
