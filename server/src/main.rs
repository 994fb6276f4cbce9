use std::sync::Arc;

use axum::{
    response::Json,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use imagepost_core::config::RenderConfig;
use imagepost_core::{Pipeline, RoundedCornerProcessor};

mod handlers;

/// Shared by every request. Processors are built once at startup.
pub struct AppState {
    pub pipeline: Pipeline,
    pub config: RenderConfig,
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/processors", get(handlers::processors))
        .route("/cache-key", get(handlers::cache_key))
        .route("/render", post(handlers::render))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut pipeline = Pipeline::new();
    pipeline.register(Box::new(RoundedCornerProcessor::new()));

    let state = Arc::new(AppState {
        pipeline,
        config: RenderConfig::default(),
    });

    let app = app(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    // Server address
    let addr = std::env::var("IMAGEPOST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    log::info!("imagepost server running on http://{}", addr);
    log::info!("API endpoints:");
    log::info!("   POST /render - Resize and post-process an image");
    log::info!("   GET  /cache-key - Cache key for an image, without rendering");
    log::info!("   GET  /processors - Registered processors");
    log::info!("   GET  /health - Health check");

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn root() -> &'static str {
    "imagepost server v0.1.0\n\nAPI Endpoints:\n  POST /render\n  GET  /cache-key\n  GET  /processors\n  GET  /health\n"
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
