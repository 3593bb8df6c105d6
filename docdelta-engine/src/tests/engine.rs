use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use docdelta::{PairFingerprint, Side};
use docdelta_classify::reviewer::parse_labeled;
use docdelta_classify::{ChangeReviewer, ModelJudgment, ReviewError, ReviewRequest};

use super::{compare_texts, quick_config, Canned};
use crate::{DocumentUpload, Engine, EngineConfig, EngineError, ErrorKind, MimeType};

const ANSWER: &str = "COMMENT: Reviewed.\nSEVERITY: medium\nCONFIDENCE: 0.7";

/// Tracks how many reviews run at the same time.
#[derive(Default)]
struct Gauge {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl ChangeReviewer for Gauge {
    fn model(&self) -> &str {
        "gauge"
    }

    async fn review(&self, _request: &ReviewRequest) -> Result<ModelJudgment, ReviewError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        parse_labeled(ANSWER)
    }
}

fn numbered(clauses: &[String]) -> String {
    clauses
        .iter()
        .enumerate()
        .map(|(i, text)| format!("{}. {}", i + 1, text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[tokio::test]
async fn empty_document_fails_the_run() {
    let engine = Engine::new(EngineConfig::default()).unwrap();
    let err = engine
        .compare(
            DocumentUpload::text("reference.txt", "Payment due in 30 days."),
            DocumentUpload::text("client.txt", " \n\n \t\n"),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::EmptyDocument { side: Side::Client }));
    assert!(err.is_client_error());
    assert!(engine.cache().is_empty());
}

#[tokio::test]
async fn unsupported_formats_are_client_errors() {
    let engine = Engine::new(EngineConfig::default()).unwrap();

    let image = engine
        .compare(
            DocumentUpload::new("scan.png", "image/png", vec![0x89, 0x50]),
            DocumentUpload::text("client.txt", "Payment due in 45 days."),
        )
        .await
        .unwrap_err();
    assert_eq!(image.kind(), ErrorKind::UnsupportedFormat);

    // Accepted upload type, but the plain-text extractor cannot read it.
    let pdf = engine
        .compare(
            DocumentUpload::text("reference.txt", "Payment due in 30 days."),
            DocumentUpload::new("client.pdf", MimeType::Pdf.as_str(), b"%PDF-1.7".to_vec()),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        pdf,
        EngineError::UnsupportedFormat { side: Side::Client, ref mime } if mime == "application/pdf"
    ));
}

#[tokio::test]
async fn oversized_documents_are_rejected() {
    let mut config = EngineConfig::default();
    config.limits.max_document_bytes = 16;
    let engine = Engine::new(config).unwrap();

    let err = engine
        .compare(
            DocumentUpload::text("reference.txt", "Payment due in 30 days."),
            DocumentUpload::text("client.txt", "Short."),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::DocumentTooLarge { side: Side::Reference, limit: 16, .. }
    ));
}

#[tokio::test]
async fn stalled_model_exhausts_the_request_budget() {
    // Every review fits the budget on its own; three in a row on one worker do not.
    let mut config = quick_config();
    config.limits.request_timeout_ms = 200;
    config.limits.workers = 1;
    config.classifier.retry.attempts = 1;
    config.classifier.retry.attempt_timeout_ms = 100;
    let engine = Engine::new(config)
        .unwrap()
        .with_reviewer(Canned::slow(ANSWER, Duration::from_secs(60)));

    let reference = numbered(&[
        "Payment is due within 30 days of the invoice.".to_string(),
        "The warranty period lasts 12 months from delivery.".to_string(),
        "Support requests are answered within 4 hours.".to_string(),
    ]);
    let client = reference.replace("30", "45").replace("12", "24").replace(" 4 ", " 8 ");

    let err = engine
        .compare(
            DocumentUpload::text("reference.txt", &reference),
            DocumentUpload::text("client.txt", &client),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::AnalysisTimeout(budget) if budget == Duration::from_millis(200)));
    assert_eq!(err.kind(), ErrorKind::AnalysisTimeout);
    assert!(!err.is_client_error());
    assert!(engine.cache().is_empty());
}

#[tokio::test]
async fn concurrent_requests_for_one_pair_share_the_work() {
    let reviewer = Canned::slow(ANSWER, Duration::from_millis(50));
    let engine = Engine::new(quick_config())
        .unwrap()
        .with_reviewer(reviewer.clone());

    let (a, b) = tokio::join!(
        compare_texts(&engine, "Payment due in 30 days.", "Payment due in 45 days."),
        compare_texts(&engine, "Payment due in 30 days.", "Payment due in 45 days."),
    );
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(reviewer.calls(), 1);

    let renamed = engine
        .compare(
            DocumentUpload::text("v1.txt", "Payment due in 30 days."),
            DocumentUpload::text("v2.txt", "Payment due in 45 days."),
        )
        .await
        .unwrap();
    assert_eq!(reviewer.calls(), 1);
    assert_eq!(renamed.summary.document_pair.reference_doc, "v1.txt");
    assert_eq!(renamed.results, a.results);
}

#[tokio::test]
async fn worker_pool_bounds_model_calls() {
    let clauses = [
        ("Payment is due within {} days of the invoice.", 30, 45),
        ("The warranty period lasts {} months from delivery.", 12, 24),
        ("Late payments accrue interest at {} percent per year.", 5, 7),
        ("The supplier keeps spare parts in stock for {} months.", 24, 36),
        ("Either party may end this agreement with {} days notice.", 60, 90),
        ("Training for up to {} employees is included.", 10, 15),
        ("Support requests are answered within {} hours.", 4, 8),
        ("The deposit of {} euros is refunded at the end of the term.", 500, 750),
    ];
    let reference: Vec<String> = clauses
        .iter()
        .map(|(text, before, _)| text.replace("{}", &before.to_string()))
        .collect();
    let client: Vec<String> = clauses
        .iter()
        .map(|(text, _, after)| text.replace("{}", &after.to_string()))
        .collect();

    let mut config = quick_config();
    config.limits.workers = 2;
    let gauge = Arc::new(Gauge::default());
    let engine = Engine::new(config).unwrap().with_reviewer(gauge.clone());

    let response = compare_texts(&engine, &numbered(&reference), &numbered(&client)).await;

    assert_eq!(response.results.len(), 8);
    assert!(gauge.peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(response.degraded(), 0);
    let originals: Vec<&str> = response.results.iter().map(|r| r.original_text.as_str()).collect();
    assert_eq!(originals, reference);
}

#[tokio::test]
async fn prepared_run_partitions_both_documents() {
    let engine = Engine::new(EngineConfig::default()).unwrap();
    let reference = DocumentUpload::text(
        "reference.txt",
        "Payment due in 30 days.\n\nThe lessee keeps the equipment in good order.\n\nNotices are sent in writing.",
    );
    let client = DocumentUpload::text(
        "client.txt",
        "Payment due in 30 days.\n\nGoverning law is the law of the seller.\n\nNotices are sent in writing.\n\nAll amendments require a signed addendum.",
    );
    let fingerprint = PairFingerprint::new(&reference.content_hash(), &client.content_hash());

    let run = engine
        .prepare(
            fingerprint,
            (reference, MimeType::Text),
            (client, MimeType::Text),
        )
        .await
        .unwrap();

    assert_eq!(run.reference.len(), 3);
    assert_eq!(run.client.len(), 4);
    assert!(run.alignment.verify_partition().is_ok());
    assert_eq!(run.alignment.stats.anchors, 2);
    assert_eq!(run.document_pair.client_doc, "client.txt");
}

#[test]
fn missing_rule_file_is_a_config_error() {
    let config = EngineConfig {
        rules_path: Some(PathBuf::from("/nonexistent/docdelta-rules.toml")),
        ..EngineConfig::default()
    };
    let err = Engine::new(config).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::InvalidConfig);
}

#[test]
fn model_is_optional() {
    let engine = Engine::new(EngineConfig::default())
        .unwrap()
        .with_model(None)
        .unwrap();
    assert!(!engine.classifier().has_reviewer());

    let engine = Engine::new(EngineConfig::default())
        .unwrap()
        .with_model(Some("sk-test".to_string()))
        .unwrap();
    assert!(engine.classifier().has_reviewer());
}
