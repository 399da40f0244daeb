use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::warn;

use crate::AppState;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/api/results", get(get_results))
        .route("/api/results/:instrument", get(get_instrument))
}

// ─── Results ──────────────────────────────────────────────────────────────────

/// Full snapshot of the latest completed cycle.
async fn get_results(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let snapshot = state.current();
    match serde_json::to_value(snapshot.as_ref()) {
        Ok(body) => (StatusCode::OK, Json(body)),
        Err(e) => {
            warn!(error = %e, "Failed to serialize snapshot");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "snapshot unavailable" })),
            )
        }
    }
}

/// Per-strategy results for one instrument, best accuracy first.
async fn get_instrument(
    State(state): State<AppState>,
    Path(instrument): Path<String>,
) -> (StatusCode, Json<Value>) {
    let symbol = instrument.to_uppercase();
    let snapshot = state.current();

    match snapshot.instruments.get(&symbol) {
        Some(reports) => (
            StatusCode::OK,
            Json(json!({
                "instrument": symbol,
                "cycle": snapshot.cycle,
                "updated_at": snapshot.updated_at,
                "strategies": reports,
            })),
        ),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("no results for '{symbol}'") })),
        ),
    }
}
