use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use docdelta_classify::Severity;
use docdelta_engine::{DocumentUpload, Engine, EngineConfig, MimeType};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Compare a client's version of a contract with the reference version and report every
/// change with its severity and the services that must approve it.
///
/// Prints the analysis as JSON on stdout. On failure prints `{ "kind", "message" }` and
/// exits with 2 for problems with the documents, 1 otherwise. Logs go to stderr.
#[derive(Debug, Parser)]
#[command(name = "docdelta", version, author)]
struct Args {
    /// Reference document (.txt, .pdf or .docx)
    reference: PathBuf,

    /// Client document (.txt, .pdf or .docx)
    client: PathBuf,

    /// Engine configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rule table to use instead of the configured one
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Only list results at or above this severity (the summary still counts all)
    #[arg(long)]
    min_severity: Option<Severity>,

    /// Classify by rules only, even when a model API key is set
    #[arg(long)]
    no_model: bool,

    /// Single-line JSON
    #[arg(long)]
    compact: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("docdelta={}", level).parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(rules) = args.rules.clone() {
        config.rules_path = Some(rules);
    }

    let api_key = if args.no_model {
        None
    } else {
        std::env::var(&config.model.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    };
    let engine = Engine::new(config)?.with_model(api_key)?;

    let reference = read_upload(&args.reference)?;
    let client = read_upload(&args.client)?;

    match engine.compare(reference, client).await {
        Ok(response) => {
            let mut response = response.as_ref().clone();
            if let Some(min) = args.min_severity {
                response.results.retain(|r| r.severity >= min);
            }
            let json = if args.compact {
                serde_json::to_string(&response)?
            } else {
                serde_json::to_string_pretty(&response)?
            };
            println!("{}", json);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            error!(kind = %err.kind(), "{}", err);
            println!("{}", serde_json::to_string_pretty(&err.body())?);
            Ok(ExitCode::from(if err.is_client_error() { 2 } else { 1 }))
        }
    }
}

/// Read a document, taking its MIME type from the file extension.
fn read_upload(path: &Path) -> anyhow::Result<DocumentUpload> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mime = MimeType::from_path(path)
        .map(MimeType::as_str)
        .unwrap_or("application/octet-stream");
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(DocumentUpload::new(name, mime, bytes))
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition() {
        Args::command().debug_assert();
        assert_eq!(Args::command().get_author(), Some("The docdelta developers"));
    }

    #[test]
    fn parses_severity_filter() {
        let args = Args::try_parse_from([
            "docdelta",
            "reference.txt",
            "client.txt",
            "--min-severity",
            "high",
            "--no-model",
        ])
        .unwrap();
        assert_eq!(args.min_severity, Some(Severity::High));
        assert!(args.no_model);
        assert_eq!(args.config, None);
    }
}
