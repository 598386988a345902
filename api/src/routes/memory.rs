use axum::extract::State;
use axum::{Json, Router, routing::get};
use recollect_core::records::MemorySnapshot;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/memory", get(memory_snapshot))
}

/// Read-only dump of every stored profile, preference and task
#[utoipa::path(
    get,
    path = "/memory",
    responses(
        (status = 200, description = "Full contents of the local store", body = MemorySnapshot)
    ),
    tag = "system"
)]
pub async fn memory_snapshot(State(state): State<AppState>) -> Json<MemorySnapshot> {
    Json(state.store.snapshot())
}
