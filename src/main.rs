use clausetag::{
    api,
    classify::{ChunkClassifier, LlmClient, OllamaClient},
    config::Config,
    elastic::EsService,
    guardrail::GuardrailService,
    logging,
    processing::{PipelineService, PipelineSettings},
    qa::QaService,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    logging::init_tracing();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        es_url = %config.es_url,
        index = %config.es_index_name,
        model = %config.llm_model,
        classify_concurrency = config.classify_concurrency,
        "Loaded configuration"
    );

    let app = api::create_router(Arc::new(build_pipeline(&config)));

    let (listener, port) = bind_listener(config.server_port)
        .await
        .expect("Failed to bind listener");
    tracing::info!("Listening on http://0.0.0.0:{}", port);
    axum::serve(listener, app).await.unwrap();
}

fn build_pipeline(config: &Config) -> PipelineService {
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
    .expect("Failed to construct Elasticsearch client");

    let classifier = ChunkClassifier::new(llm.clone());
    let guardrail = GuardrailService::new(llm.clone());
    let qa = QaService::new(
        guardrail,
        search.clone(),
        llm,
        config.es_index_name.clone(),
    );

    PipelineService::new(
        classifier,
        search,
        qa,
        PipelineSettings {
            index_name: config.es_index_name.clone(),
            chunk_max_chars: config.chunk_max_chars,
            chunk_overlap: config.chunk_overlap,
            classify_concurrency: config.classify_concurrency,
        },
    )
}

async fn bind_listener(port_override: Option<u16>) -> Result<(TcpListener, u16), std::io::Error> {
    use std::net::Ipv4Addr;

    if let Some(port) = port_override {
        return TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
            .await
            .map(|listener| (listener, port));
    }

    const PORT_RANGE: std::ops::RangeInclusive<u16> = 4200..=4299;
    for port in PORT_RANGE {
        match TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await {
            Ok(listener) => {
                tracing::debug!(port, "Bound server port");
                return Ok((listener, port));
            }
            Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
                tracing::debug!(port, "Port already in use; trying next");
                continue;
            }
            Err(err) => return Err(err),
        }
    }

    Err(std::io::Error::new(
        std::io::ErrorKind::AddrNotAvailable,
        "No available port found in range 4200-4299",
    ))
}
