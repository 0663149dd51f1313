use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use clausetag::{
    classify::{ChunkClassifier, LlmClient, OllamaClient},
    config::Config,
    elastic::EsService,
    extract::SourceType,
    guardrail::GuardrailService,
    processing::{IngestOutcome, PipelineService, PipelineSettings},
    qa::QaService,
};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(
    name = "ingest",
    about = "Ingest legal documents from disk into the tagged index"
)]
struct Cli {
    /// File or directory containing .txt/.pdf documents.
    #[arg(long)]
    path: PathBuf,
    /// Optional index override (defaults to ES_INDEX_NAME).
    #[arg(long)]
    index: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    clausetag::logging::init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;
    let service = build_pipeline(&config)?;

    let mut ingested = 0usize;
    for entry in WalkDir::new(&cli.path)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
    {
        let path = entry.path();
        let Some(source_type) = SourceType::from_path(path) else {
            tracing::debug!(path = %path.display(), "Skipping unsupported file");
            continue;
        };

        match ingest_one(&service, path, source_type, cli.index.clone()).await {
            Ok(outcome) => {
                println!(
                    "{} -> doc {} ({} chunks)",
                    path.display(),
                    outcome.doc_id,
                    outcome.chunks_ingested
                );
                ingested += 1;
            }
            Err(error) => {
                tracing::error!(path = %path.display(), error = %error, "Ingestion failed");
            }
        }
    }

    if ingested == 0 {
        bail!("no documents ingested from {}", cli.path.display());
    }
    Ok(())
}

async fn ingest_one(
    service: &PipelineService,
    path: &Path,
    source_type: SourceType,
    index: Option<String>,
) -> Result<IngestOutcome> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("unknown")
        .to_string();

    let outcome = service
        .ingest_source(&bytes, source_type, file_name, index)
        .await
        .with_context(|| format!("failed to ingest {}", path.display()))?;
    Ok(outcome)
}

fn build_pipeline(config: &Config) -> Result<PipelineService> {
    let llm: Arc<dyn LlmClient> = Arc::new(OllamaClient::new(
        config.ollama_url.clone(),
        config.llm_model.clone(),
        Duration::from_secs(config.llm_timeout_secs),
    ));
    let search = EsService::new(
        &config.es_url,
        config.es_api_key.clone(),
        Duration::from_secs(config.es_timeout_secs),
    )
    .context("failed to construct Elasticsearch client")?;

    let classifier = ChunkClassifier::new(llm.clone());
    let guardrail = GuardrailService::new(llm.clone());
    let qa = QaService::new(
        guardrail,
        search.clone(),
        llm,
        config.es_index_name.clone(),
    );

    Ok(PipelineService::new(
        classifier,
        search,
        qa,
        PipelineSettings {
            index_name: config.es_index_name.clone(),
            chunk_max_chars: config.chunk_max_chars,
            chunk_overlap: config.chunk_overlap,
            classify_concurrency: config.classify_concurrency,
        },
    ))
}
