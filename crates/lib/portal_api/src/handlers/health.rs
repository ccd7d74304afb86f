//! Liveness probe.

use axum::Json;
use axum::extract::State;

use crate::AppState;

/// `GET /api/health` — liveness plus a database reachability flag.
pub async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let db_connected = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.pool)
        .await
        .is_ok();
    Json(serde_json::json!({
        "status": "ok",
        "dbConnected": db_connected,
    }))
}
