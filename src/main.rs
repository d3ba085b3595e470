//! Seller Draft server.
//!
//! Wires configuration, storage, knowledge, the reply generator and the
//! HTTP router, then serves until Ctrl-C.

use std::sync::Arc;

use secrecy::ExposeSecret;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use seller_draft::adapters::ai::{
    ChatCompletionsConfig, ChatCompletionsReplyGenerator, MockReplyGenerator,
};
use seller_draft::adapters::http::{app_router, AppState};
use seller_draft::adapters::knowledge::KeywordKnowledgeRetriever;
use seller_draft::adapters::postgres::{self, PostgresConversationStore, PostgresThreadStore};
use seller_draft::adapters::storage::{InMemoryConversationStore, InMemoryThreadStore};
use seller_draft::application::{DraftSessionManager, SellerHintsService};
use seller_draft::config::{AiConfig, AiProvider, AppConfig, DatabaseConfig, DraftingConfig};
use seller_draft::domain::drafting::RequirementRanker;
use seller_draft::ports::{ConversationStore, KnowledgeRetriever, ReplyGenerator, ThreadStore};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    let (conversations, threads) = build_stores(&config.database).await?;
    let retriever = build_retriever(&config.drafting)?;
    let generator = build_generator(&config.ai, &config.drafting, threads.clone())?;
    let provider = generator.provider_info();

    let hints = SellerHintsService::new(retriever)
        .with_top_k(config.drafting.retrieval_top_k)
        .with_ranker(
            RequirementRanker::new()
                .with_max_items(config.drafting.max_requirements)
                .with_empty_text(config.drafting.empty_requirements_text.clone()),
        );
    let manager = Arc::new(DraftSessionManager::new(
        generator,
        hints,
        conversations,
        threads,
    ));

    let app = app_router(AppState::new(manager, provider.clone()), &config.server);
    let addr = config.server.socket_addr()?;

    tracing::info!(
        %addr,
        environment = ?config.server.environment,
        provider = %provider.name,
        model = %provider.model,
        "seller-draft listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("seller-draft stopped");
    Ok(())
}

/// JSON logs in production, pretty logs elsewhere. `RUST_LOG` wins over
/// the configured filter.
fn init_tracing(config: &AppConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if config.is_production() {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry.with(fmt::layer().pretty().with_target(true)).init();
    }
}

async fn build_stores(
    database: &DatabaseConfig,
) -> Result<(Arc<dyn ConversationStore>, Arc<dyn ThreadStore>), BoxError> {
    match database.url() {
        Some(url) => {
            let pool =
                postgres::connect(url, database.max_connections, database.acquire_timeout()).await?;
            Ok((
                Arc::new(PostgresConversationStore::new(pool.clone())),
                Arc::new(PostgresThreadStore::new(pool)),
            ))
        }
        None => {
            tracing::warn!("no database configured, conversations are kept in memory");
            Ok((
                Arc::new(InMemoryConversationStore::new()),
                Arc::new(InMemoryThreadStore::new()),
            ))
        }
    }
}

fn build_retriever(drafting: &DraftingConfig) -> Result<Arc<dyn KnowledgeRetriever>, BoxError> {
    let retriever = match &drafting.knowledge_path {
        Some(path) => KeywordKnowledgeRetriever::from_path(path)?,
        None => KeywordKnowledgeRetriever::builtin(),
    };
    tracing::info!(sections = retriever.len(), "knowledge base loaded");
    Ok(Arc::new(retriever))
}

fn build_generator(
    ai: &AiConfig,
    drafting: &DraftingConfig,
    threads: Arc<dyn ThreadStore>,
) -> Result<Arc<dyn ReplyGenerator>, BoxError> {
    match ai.provider {
        AiProvider::Mock => Ok(Arc::new(MockReplyGenerator::new())),
        AiProvider::OpenAI => {
            let api_key = ai
                .api_key
                .as_ref()
                .map(|k| k.expose_secret().clone())
                .unwrap_or_default();
            let config = ChatCompletionsConfig::new(api_key)
                .with_model(ai.model.clone())
                .with_base_url(ai.base_url.clone())
                .with_timeout(ai.timeout())
                .with_max_retries(ai.max_retries)
                .with_temperature(ai.temperature)
                .with_max_tokens(ai.max_tokens)
                .with_history_window(drafting.history_window);
            Ok(Arc::new(ChatCompletionsReplyGenerator::new(config, threads)?))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
