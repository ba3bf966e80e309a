use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};
use tracing::{instrument, warn};

use super::api::ApiState;

/// Health check endpoint handler. Reports 503 when the store cannot be reached.
#[instrument(name = "health_check", skip(state))]
pub async fn health_check(State(state): State<ApiState>) -> (StatusCode, Json<Value>) {
    state
        .metrics
        .set_pool_connections(state.database.pool().size() as f64);

    let (status, database) = match state.database.health_check().await {
        Ok(()) => (StatusCode::OK, "up"),
        Err(err) => {
            warn!("Database health check failed: {}", err);
            (StatusCode::SERVICE_UNAVAILABLE, "down")
        }
    };

    let overall = if status == StatusCode::OK {
        "healthy"
    } else {
        "unhealthy"
    };

    (
        status,
        Json(json!({
            "status": overall,
            "service": "storefront-rs",
            "version": env!("CARGO_PKG_VERSION"),
            "database": database,
            "timestamp": chrono::Utc::now().to_rfc3339()
        })),
    )
}
