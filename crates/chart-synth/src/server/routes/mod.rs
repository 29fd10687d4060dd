//! API routes for the chart server

pub mod generate;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Chart generation - body limit covers the optional upload
        .route(
            "/generate",
            post(generate::generate_chart).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let config = state.config();
    let schema = state.pipeline().schema().to_json_schema();

    Json(serde_json::json!({
        "name": "chart-synth",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Natural-language chart generation with optional CSV grounding",
        "endpoints": {
            "POST /api/generate": "Multipart form: 'prompt' text and optional 'file' upload",
            "GET /api/info": "Service information",
            "GET /health": "Liveness check"
        },
        "chartTypes": schema["properties"]["chartType"]["enum"].clone(),
        "documentTypes": state.pipeline().supported_media_types(),
        "models": {
            "chat": config.llm.chat_model,
            "embeddings": config.llm.embed_model
        },
        "maxUploadSize": config.server.max_upload_size
    }))
}
