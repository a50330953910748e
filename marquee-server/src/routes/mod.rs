pub mod v1;

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::infra::app_state::AppState;

/// Health check plus the versioned API mounted at `api_prefix`.
pub fn create_api_router(state: AppState) -> Router<AppState> {
    let prefix = state.config.server.api_prefix.clone();
    let v1 = v1::create_v1_router(state);

    let router = Router::new().route("/", get(health));
    if prefix == "/" {
        router.merge(v1)
    } else {
        router.nest(&prefix, v1)
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "ping": "pong!" }))
}
