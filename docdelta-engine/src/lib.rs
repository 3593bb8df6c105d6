//! Document comparison engine.
//!
//! [`Engine`] ties the docdelta crates into one request: validate the two uploads,
//! extract and normalize them in parallel, align their units, extract and classify the
//! changes of every correspondence on a bounded pool, and assemble an ordered
//! [`AnalysisResponse`] with deterministic ids.
//!
//! Failures that invalidate the comparison (empty or unsupported documents, timeouts) are
//! returned as [`EngineError`]s with a machine-readable [`ErrorKind`]. A language model that
//! cannot be reached never fails a request: the affected changes are reported with rule-based
//! severity and low confidence.
//!
//! ```
//! use docdelta_engine::{DocumentUpload, Engine, EngineConfig};
//!
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//! let engine = Engine::new(EngineConfig::default()).unwrap();
//! let response = engine
//!     .compare(
//!         DocumentUpload::text("reference.txt", "Payment due in 30 days."),
//!         DocumentUpload::text("client.txt", "Payment due in 45 days."),
//!     )
//!     .await
//!     .unwrap();
//!
//! assert_eq!(response.summary.total_changes, 1);
//! assert_eq!(response.results[0].highlighted_original, "Payment due in [-]30[/-] days.");
//! # });
//! ```

mod assemble;
pub mod cache;
pub mod config;
pub mod document;
mod errors;
pub mod extract;
pub mod result;
mod run;

pub use assemble::{ClassifiedChange, ResultAssembler};
pub use cache::ResponseCache;
pub use config::{EngineConfig, LimitsConfig};
pub use document::{DocumentUpload, ExportFormat, MimeType};
pub use errors::{EngineError, ErrorBody, ErrorKind};
pub use extract::{PlainTextExtractor, TextExtractor};
pub use result::{AnalysisResponse, AnalysisResult, DocumentPair, ResultTrace, Summary};
pub use run::{AnalysisRun, Engine};
