//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbStore, NullStore},
    config::Config,
    draft::DraftStore,
    error::ApiError,
    web::{
        composer_page_handler, create_letter_handler, fallback_handler, fetch_letter_handler,
        mark_opened_handler, record_response_handler, rest::ApiDoc, state::AppState,
        status_handler, status_page_handler, viewer_page_handler, ws_handler,
    },
};
use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use valentine_core::ports::LetterStore;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Select the Letter Store ---
    let store: Arc<dyn LetterStore> = match &config.database_url {
        Some(database_url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let db_store = DbStore::new(db_pool);
            info!("Running database migrations...");
            db_store.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(db_store)
        }
        None => {
            warn!(
                "DATABASE_URL is missing. The app will run without a letter store; \
                 letters won't be saved or shared."
            );
            Arc::new(NullStore)
        }
    };

    // --- 3. Build the Shared AppState ---
    let drafts = DraftStore::new(config.draft_path.clone());
    let app_state = Arc::new(AppState {
        store,
        drafts,
        config: config.clone(),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    // --- 4. Create the Web Router ---
    // The store surface plus the three addressable views (composer at the
    // root, viewer by letter id, status by sender token) and the session
    // socket.
    let api_router = Router::new()
        .route("/", get(composer_page_handler))
        .route("/v/{id}", get(viewer_page_handler))
        .route("/check/{token}", get(status_page_handler))
        .route("/letters", post(create_letter_handler))
        .route("/letters/{id}", get(fetch_letter_handler))
        .route("/letters/{id}/opened", post(mark_opened_handler))
        .route("/letters/{id}/response", post(record_response_handler))
        .route("/status/{token}", get(status_handler))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router, and send every
    // unknown path back to the composer.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(fallback_handler);

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
