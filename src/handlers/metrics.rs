use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{error, instrument};

use super::api::ApiState;

/// Handler for Prometheus metrics endpoint
#[instrument(name = "metrics_handler", skip(state))]
pub async fn metrics_handler(State(state): State<ApiState>) -> Response {
    state
        .metrics
        .set_pool_connections(state.database.pool().size() as f64);

    match state.metrics.encode() {
        Ok(metrics_text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            metrics_text,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics",
            )
                .into_response()
        }
    }
}
