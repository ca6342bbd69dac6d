use axum::{Json, Router, extract::{Query, State}, routing::{get, post}};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::{Any, CorsLayer}, trace::TraceLayer};

use crate::{
    error::AppError,
    generations::GenerationService,
    models::{GenerateRequest, GenerationRecord, ListQuery, ListResponse, MessageResponse, StatusReport},
};

#[derive(Clone)]
pub struct AppState {
    pub generations: Arc<GenerationService>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(read_root))
        .route("/api/hello", get(hello))
        .route("/test", get(store_status))
        .route("/api/generate", post(generate_image))
        .route("/api/generations", get(list_generations))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}

pub async fn read_root() -> Json<MessageResponse> {
    Json(MessageResponse { message: "Prompt Canvas is running".into() })
}

pub async fn hello() -> Json<MessageResponse> {
    Json(MessageResponse { message: "Hello from the Prompt Canvas API!".into() })
}

/// Reports store reachability. Always 200, the payload carries the verdict.
pub async fn store_status(State(state): State<AppState>) -> Json<StatusReport> {
    let (database, connection_status, collections) = match state.generations.store_collections().await {
        Ok(mut names) => {
            names.truncate(10);
            ("✅ Connected & Working".to_string(), "Connected".to_string(), names)
        }
        Err(e) => {
            tracing::warn!("⚠️ Store status check failed: {}", e);
            (format!("❌ Not Available: {}", e), "Not Connected".to_string(), Vec::new())
        }
    };
    Json(StatusReport {
        backend: "✅ Running".into(),
        store_backend: state.generations.store_backend().into(),
        database,
        connection_status,
        collections,
    })
}

pub async fn generate_image(State(state): State<AppState>, Json(body): Json<GenerateRequest>) -> Result<Json<GenerationRecord>, AppError> {
    let record = state.generations.generate(body).await?;
    Ok(Json(record))
}

pub async fn list_generations(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Json<ListResponse> {
    let items = state.generations.list(query.limit).await;
    tracing::info!("📚 Listing {} generations (limit {})", items.len(), query.limit);
    Json(ListResponse { items })
}
