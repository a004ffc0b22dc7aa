//! Liveness probe.

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "realtime": {
            "running": state.hub.is_running(),
            "connections": state.hub.connection_count(),
        }
    }))
}
