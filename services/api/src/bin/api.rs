//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        DbAdapter, DisabledVideoSearch, OpenAiTextAdapter, SessionIdentityProvider,
        YouTubeAdapter,
    },
    config::Config,
    error::ApiError,
    web::{build_router, rest::ApiDoc, state::AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use axum::Router;
use course_core::ports::{DatabaseService, IdentityProvider, VideoSearchService};
use course_core::{ContentGenerator, GenerationOrchestrator, InMemoryStore, VideoFinder};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    let db: Arc<dyn DatabaseService> = match &config.database_url {
        Some(database_url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let db_adapter = DbAdapter::new(db_pool);
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(db_adapter)
        }
        None => {
            warn!("DATABASE_URL is not set; courses and accounts are kept in memory only.");
            Arc::new(InMemoryStore::new())
        }
    };

    // --- 3. Initialize Service Adapters ---
    let openai_config = OpenAIConfig::new().with_api_key(config.openai_api_key.as_str());
    let openai_client = Client::with_config(openai_config);
    let text_adapter = Arc::new(OpenAiTextAdapter::new(
        openai_client,
        config.generation_model.clone(),
    ));

    let video_search: Arc<dyn VideoSearchService> = match &config.youtube_api_key {
        Some(api_key) => Arc::new(YouTubeAdapter::new(reqwest::Client::new(), api_key.clone())),
        None => {
            warn!("YOUTUBE_API_KEY is not set; video searches will return nothing.");
            Arc::new(DisabledVideoSearch)
        }
    };

    // --- 4. Build the Orchestrator & Shared AppState ---
    let orchestrator = Arc::new(GenerationOrchestrator::new(
        db.clone(),
        ContentGenerator::new(text_adapter, config.generation_timeout),
        VideoFinder::new(video_search, config.generation_timeout),
        config.generation_policy(),
    ));
    let identity: Arc<dyn IdentityProvider> = Arc::new(SessionIdentityProvider::new(db.clone()));

    let app_state = Arc::new(AppState {
        db,
        config: config.clone(),
        identity,
        orchestrator,
    });

    // --- 5. Create the Web Router ---
    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(build_router(app_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
