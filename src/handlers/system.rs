use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::bounded;
use crate::state::AppState;

/// GET / - Service description
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Opportunity API",
        "version": version,
        "endpoints": {
            "health": "/health (public)",
            "auth": "/signup, /login, /logout (public)",
            "opportunity": "GET /opportunity/:id (public)",
            "opportunities": "/opportunities[/:userid], /opportunity[/:userid[/:id]] (session)"
        }
    }))
}

/// GET /health - Store liveness
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match bounded(state.config.request_timeout(), state.opportunities.ping()).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}
