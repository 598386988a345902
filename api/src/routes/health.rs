use axum::extract::State;
use axum::{Json, Router, routing::get};
use recollect_core::records::MemoryCounts;
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// Transport flavour agents should expect
    pub protocol: String,
    pub version: String,
    /// Backend answering tool calls: "memory" or "subprocess"
    pub backend: String,
    pub stats: MemoryCounts,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Health check with collection counts from the local store
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        protocol: "SSE (Legacy)".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: state.backend.kind().to_string(),
        stats: state.store.counts(),
    })
}
