use axum::Json;
use serde_json::{json, Value};

/// GET /api/health
///
/// Simple liveness check for the dashboard process itself (the agent's own
/// liveness comes from `agent_state.is_alive`).
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
