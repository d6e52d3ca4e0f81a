use anyhow::Result;
use doc_translation_cache::{
    config::Config,
    db::PgDocumentStore,
    i18n::TranslationMetrics,
    openai::OpenAiProvider,
    provider::ProviderClient,
    server::{self, AppState},
    store::{DocumentStore, MemoryStore},
    translator::TranslationService,
};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("doc_translation_cache=info".parse()?),
        )
        .init();

    info!("Starting document translation service");

    // Load configuration from environment
    let config = Config::from_env()?;
    info!("Environment: {}", config.environment);

    let store: Arc<dyn DocumentStore> = match &config.database_url {
        Some(url) => Arc::new(PgDocumentStore::connect(url).await?),
        None => {
            warn!("DATABASE_URL not set, translations are cached in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let provider = Arc::new(OpenAiProvider::new(reqwest::Client::new(), &config));
    let client = ProviderClient::new(provider, Arc::new(TranslationMetrics::new()))
        .with_max_concurrency(config.provider_max_concurrency)
        .with_timeout(config.provider_timeout);

    if config.api_key.is_none() {
        warn!("API_KEY not set, translation endpoints are unauthenticated");
    }

    let state = Arc::new(AppState {
        service: TranslationService::new(client, store),
        api_key: config.api_key.clone(),
    });

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!("Listening on port {}", config.port);
    axum::serve(listener, server::router(state)).await?;

    Ok(())
}
