use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;

pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Character API",
        "version": version,
        "description": "Query and manage a catalog of fictional characters",
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "login": "POST /auth/login (public - token acquisition)",
            "whoami": "GET /auth/whoami (protected)",
            "list": "GET /characters/list (optional auth)",
            "show": "GET /characters/:id (optional auth)",
            "create": "POST /characters (protected)",
            "update": "PATCH /characters/:id (protected)",
            "delete": "DELETE /characters/:id (protected)"
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let store = state.store.backend().as_str();

    match state.store.health().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok", "store": store, "timestamp": now }))),
        Err(e) => {
            tracing::error!("Health check failed for {} store: {}", store, e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "store": store, "timestamp": now })),
            )
        }
    }
}
