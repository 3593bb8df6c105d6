//! One comparison request, end to end.
//!
//! ```text
//! uploads ──validate──► fingerprint ──cache──┐
//!                                            ▼
//!   reference ─extract─normalize─┐     (spawn_blocking, in parallel)
//!   client    ─extract─normalize─┴─► align ─► verify partition
//!                                            │
//!            correspondences in reference order, `workers` at a time
//!                 extract candidates ─► classify (shared permit pool)
//!                                            │
//!                                       assemble ─► AnalysisResponse
//! ```
//!
//! The whole request runs under `limits.request_timeout_ms`; when the budget runs out the
//! request fails with [`EngineError::AnalysisTimeout`] and nothing partial is returned.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use docdelta::{DocumentNormalizer, NormalizedDocument, PairFingerprint, Side};
use docdelta_align::{Alignment, Correspondence, StructuralAligner};
use docdelta_classify::{
    ChangeReviewer, ClassificationContext, OpenAiReviewer, RuleTable, SeverityClassifier,
};
use docdelta_diff::ChangeExtractor;
use futures::stream::{self, StreamExt};
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use crate::assemble::{ClassifiedChange, ResultAssembler};
use crate::cache::ResponseCache;
use crate::config::EngineConfig;
use crate::document::{DocumentUpload, MimeType};
use crate::extract::{PlainTextExtractor, TextExtractor};
use crate::result::{AnalysisResponse, DocumentPair};
use crate::EngineError;

/// Everything one comparison derives from its two documents before classification.
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    pub fingerprint: PairFingerprint,
    pub document_pair: DocumentPair,
    pub reference: NormalizedDocument,
    pub client: NormalizedDocument,
    /// Verified partition of both unit sequences
    pub alignment: Alignment,
}

impl AnalysisRun {
    /// Correspondences in reference-document order.
    pub fn ordered(&self) -> Vec<&Correspondence> {
        self.alignment.in_reference_order()
    }
}

/// Compares document pairs.
///
/// Holds only read-only collaborators plus the response cache and the permit pool bounding
/// outbound model calls across concurrent requests. Share it behind an `Arc`.
pub struct Engine {
    config: EngineConfig,
    normalizer: DocumentNormalizer,
    aligner: StructuralAligner,
    changes: ChangeExtractor,
    classifier: SeverityClassifier,
    text: Arc<dyn TextExtractor>,
    permits: Semaphore,
    cache: ResponseCache,
}

impl Engine {
    /// Engine with the configured rule table (the built-in one unless `rules_path` is set),
    /// no language model and the plain-text extractor.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let rules = match &config.rules_path {
            Some(path) => RuleTable::load(path)?,
            None => RuleTable::builtin()?,
        };
        Self::with_rules(config, Arc::new(rules))
    }

    pub fn with_rules(config: EngineConfig, rules: Arc<RuleTable>) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            normalizer: DocumentNormalizer::with_config(config.normalizer.clone()),
            aligner: StructuralAligner::with_config(config.aligner.clone()),
            changes: ChangeExtractor::with_config(config.diff.clone()),
            classifier: SeverityClassifier::new(rules, config.classifier.clone()),
            text: Arc::new(PlainTextExtractor),
            permits: Semaphore::new(config.limits.workers),
            cache: ResponseCache::new(config.limits.cache_capacity),
            config,
        })
    }

    pub fn with_reviewer(mut self, reviewer: Arc<dyn ChangeReviewer>) -> Self {
        self.classifier = self.classifier.with_reviewer(reviewer);
        self
    }

    /// Attach the configured chat-completions model when an API key is available.
    pub fn with_model(self, api_key: Option<String>) -> Result<Self, EngineError> {
        match api_key {
            Some(key) => {
                let reviewer = OpenAiReviewer::new(self.config.model.clone(), key)
                    .map_err(|e| EngineError::Config(e.to_string()))?;
                Ok(self.with_reviewer(Arc::new(reviewer)))
            }
            None => {
                warn!("no model API key configured, changes are classified by rules only");
                Ok(self)
            }
        }
    }

    pub fn with_text_extractor(mut self, text: Arc<dyn TextExtractor>) -> Self {
        self.text = text;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn classifier(&self) -> &SeverityClassifier {
        &self.classifier
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Compare a reference document with a client document.
    ///
    /// Repeated requests for byte-identical pairs are served from the cache; concurrent ones
    /// share a single computation.
    #[instrument(skip_all, fields(reference = %reference.name, client = %client.name))]
    pub async fn compare(
        &self,
        reference: DocumentUpload,
        client: DocumentUpload,
    ) -> Result<Arc<AnalysisResponse>, EngineError> {
        let started = Instant::now();
        let limit = self.config.limits.max_document_bytes;
        let reference_mime = reference.validate(Side::Reference, limit)?;
        let client_mime = client.validate(Side::Client, limit)?;

        let fingerprint = PairFingerprint::new(&reference.content_hash(), &client.content_hash());
        let document_pair = DocumentPair {
            reference_doc: reference.name.clone(),
            client_doc: client.name.clone(),
        };
        info!(pair = %fingerprint.short(12), "comparison started");

        let budget = self.config.limits.request_timeout();
        let computation = self.cache.get_or_compute(fingerprint, || async move {
            let run = self
                .prepare(fingerprint, (reference, reference_mime), (client, client_mime))
                .await?;
            let changes = self.classify_all(&run).await;
            Ok(ResultAssembler::new(fingerprint, Utc::now()).assemble(
                changes,
                run.document_pair,
                started.elapsed(),
            ))
        });

        let response = match tokio::time::timeout(budget, computation).await {
            Ok(outcome) => outcome?,
            Err(_) => {
                warn!(pair = %fingerprint.short(12), ?budget, "comparison ran out of time");
                self.cache.abandon(&fingerprint);
                return Err(EngineError::AnalysisTimeout(budget));
            }
        };

        info!(
            pair = %fingerprint.short(12),
            changes = response.summary.total_changes,
            critical = response.summary.critical_changes,
            elapsed = ?started.elapsed(),
            "comparison finished"
        );

        if response.summary.document_pair != document_pair {
            let mut renamed = AnalysisResponse::clone(&response);
            renamed.summary.document_pair = document_pair;
            return Ok(Arc::new(renamed));
        }
        Ok(response)
    }

    /// Extract, normalize and align both documents.
    pub async fn prepare(
        &self,
        fingerprint: PairFingerprint,
        reference: (DocumentUpload, MimeType),
        client: (DocumentUpload, MimeType),
    ) -> Result<AnalysisRun, EngineError> {
        let document_pair = DocumentPair {
            reference_doc: reference.0.name.clone(),
            client_doc: client.0.name.clone(),
        };

        let (reference, client) = tokio::try_join!(
            self.normalize(Side::Reference, reference.0, reference.1),
            self.normalize(Side::Client, client.0, client.1),
        )?;

        let aligner = self.aligner.clone();
        let (alignment, reference, client) = tokio::task::spawn_blocking(
            move || -> Result<_, EngineError> {
                let alignment = aligner.align(&reference.units, &client.units);
                alignment.verify_partition()?;
                Ok((alignment, reference, client))
            },
        )
        .await
        .map_err(|e| EngineError::Internal(format!("alignment task failed: {}", e)))??;

        let stats = &alignment.stats;
        info!(
            anchors = stats.anchors,
            matched = stats.matched,
            split = stats.split,
            merged = stats.merged,
            inserted = stats.inserted,
            deleted = stats.deleted,
            comparisons = stats.comparisons,
            "documents aligned"
        );

        Ok(AnalysisRun {
            fingerprint,
            document_pair,
            reference,
            client,
            alignment,
        })
    }

    async fn normalize(
        &self,
        side: Side,
        upload: DocumentUpload,
        mime: MimeType,
    ) -> Result<NormalizedDocument, EngineError> {
        let text = Arc::clone(&self.text);
        let normalizer = self.normalizer.clone();

        let document = tokio::task::spawn_blocking(
            move || -> Result<NormalizedDocument, EngineError> {
                let extracted = text.extract(side, mime, &upload)?;
                Ok(normalizer.normalize(side, &extracted)?)
            },
        )
        .await
        .map_err(|e| EngineError::Internal(format!("{} extraction task failed: {}", side, e)))??;

        info!(
            %side,
            units = document.stats.units,
            words = document.stats.words,
            chars = document.stats.chars,
            dropped = document.stats.dropped_fragments,
            page_artifacts = document.stats.page_artifacts,
            language = %document.stats.language,
            "document normalized"
        );
        Ok(document)
    }

    /// Extract and classify the changes of every correspondence, `limits.workers`
    /// correspondences at a time.
    #[instrument(skip_all, fields(pair = %run.fingerprint.short(12)))]
    pub async fn classify_all(&self, run: &AnalysisRun) -> Vec<ClassifiedChange> {
        let batches: Vec<Vec<ClassifiedChange>> = stream::iter(run.ordered().into_iter().enumerate())
            .map(|(rank, corr)| self.process(run, rank, corr))
            .buffer_unordered(self.config.limits.workers)
            .collect()
            .await;

        let changes: Vec<ClassifiedChange> = batches.into_iter().flatten().collect();
        let degraded = changes
            .iter()
            .filter(|c| c.classification.is_degraded())
            .count();
        if degraded > 0 {
            warn!(
                degraded,
                total = changes.len(),
                "some changes were classified without the language model"
            );
        }
        changes
    }

    async fn process(
        &self,
        run: &AnalysisRun,
        rank: usize,
        corr: &Correspondence,
    ) -> Vec<ClassifiedChange> {
        let candidates = self
            .changes
            .extract(corr, &run.reference.units, &run.client.units);
        if !candidates.is_empty() {
            debug!(rank, kind = ?corr.kind, candidates = candidates.len(), "changes extracted");
        }

        let mut classified = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let context = ClassificationContext::for_candidate(
                &candidate,
                &run.reference.units,
                &run.client.units,
            );
            let classification = {
                // The pool is never closed, so acquiring only waits.
                let _permit = self.permits.acquire().await.ok();
                self.classifier.classify(&candidate, &context).await
            };
            classified.push(ClassifiedChange {
                rank,
                candidate,
                classification,
            });
        }
        classified
    }
}
