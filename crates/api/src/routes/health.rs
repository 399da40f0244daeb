use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::AppState;

pub fn health_router() -> Router<AppState> {
    Router::new().route("/healthz", get(healthz))
}

/// Health check endpoint. Reports the cataloger state and the last cycle.
async fn healthz(State(state): State<AppState>) -> Json<Value> {
    let catalog_state = *state.catalog_state.read().await;
    let snapshot = state.current();
    Json(json!({
        "status": "ok",
        "cataloger": catalog_state.to_string(),
        "cycle": snapshot.cycle,
        "updated_at": snapshot.updated_at,
    }))
}
