//! Paddock RAG server binary
//!
//! Run with: cargo run -p paddock-rag --bin paddock-rag-server -- --config paddock.toml

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use paddock_rag::{
    config::RagConfig,
    providers::{KeyValueStore, LocalVectorStore, ModelProviders, RedisStore, VectorStoreProvider},
    server::{state::AppState, RagServer},
    RagPipeline,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Answer questions about the live F1 snapshot over WebSocket
#[derive(Parser, Debug)]
#[command(name = "paddock-rag-server", version, about)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "PADDOCK_CONFIG")]
    config: Option<PathBuf>,

    /// Listen host
    #[arg(long)]
    host: Option<String>,

    /// Listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Generative model name
    #[arg(short, long)]
    model: Option<String>,

    /// Redis connection URL
    #[arg(long)]
    redis_url: Option<String>,
}

impl Args {
    fn apply(self, config: &mut RagConfig) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(model) = self.model {
            config.llm.model = model;
        }
        if let Some(url) = self.redis_url {
            config.store.url = url;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paddock_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let mut config = RagConfig::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Store: {} (key {})", config.store.url, config.store.key);
    tracing::info!(
        "  - Embeddings: {:?} {} ({} dims)",
        config.embeddings.provider,
        config.embeddings.model,
        config.embeddings.dimensions
    );
    tracing::info!("  - LLM: {:?} {}", config.llm.provider, config.llm.model);
    tracing::info!(
        "  - Chunking: {} chars, {} overlap",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );
    tracing::info!("  - Index: {:?} at {}", config.index.mode, config.index.path.display());

    let store: Arc<dyn KeyValueStore> = Arc::new(RedisStore::new(&config.store)?);
    let providers = ModelProviders::from_config(&config)?;
    let vector_store: Arc<dyn VectorStoreProvider> =
        Arc::new(LocalVectorStore::new(config.index.path.clone()));

    check("Store", store.name(), store.health_check().await);
    check(
        "Embeddings",
        providers.embedder.name(),
        providers.embedder.health_check().await,
    );
    check("LLM", providers.llm.name(), providers.llm.health_check().await);
    check(
        "Index store",
        vector_store.name(),
        vector_store.health_check().await,
    );

    let pipeline = Arc::new(RagPipeline::from_config(
        &config,
        store,
        providers,
        vector_store,
    )?);
    let server = RagServer::new(AppState::new(config, pipeline));

    println!("\nServer starting...");
    println!("  WebSocket: ws://{}/ws", server.address());
    println!("  Query:     http://{}/api/query", server.address());
    println!("  Health:    http://{}/health", server.address());
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}

fn check(what: &str, name: &str, result: paddock_rag::Result<bool>) {
    match result {
        Ok(true) => tracing::info!("{} ({}) is available", what, name),
        Ok(false) => tracing::warn!("{} ({}) is not responding", what, name),
        Err(e) => tracing::warn!("{} ({}) health check failed: {}", what, name, e),
    }
}
