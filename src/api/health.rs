use axum::extract::State;
use axum::Json;

use super::AppState;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Ready once the journal has been replayed, which `LedgerService::open`
/// guarantees before the router exists.
pub async fn ready(State(state): State<AppState>) -> Json<serde_json::Value> {
    let vault = state.ledger.read().await;
    Json(serde_json::json!({
        "status": "ready",
        "state": vault.settings().state,
        "lastTimestamp": vault.last_timestamp(),
    }))
}
