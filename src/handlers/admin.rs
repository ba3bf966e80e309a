use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::Json,
};
use tracing::{error, info, instrument, warn};

use super::api::{json_body, path_params, service_error_to_response, ApiState, ErrorResponse};
use crate::models::{CreateProductRequest, Product, UpdateProductRequest};

// =============================================================================
// PRODUCT MANAGEMENT ENDPOINTS
// =============================================================================

/// Create a new catalog product
#[instrument(name = "admin_create_product", skip(state, payload))]
pub async fn create_product(
    State(state): State<ApiState>,
    payload: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), ErrorResponse> {
    let request = json_body(payload)?;
    info!("Creating product: {}", request.name);

    let result = state.product_service.create_product(request).await;
    state
        .metrics
        .record_product_operation("create", result.is_ok());

    match result {
        Ok(product) => {
            info!(product_id = product.id, "Created product");
            Ok((StatusCode::CREATED, Json(product)))
        }
        Err(err) => {
            error!("Failed to create product: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

/// Apply a partial update to an existing product
#[instrument(name = "admin_update_product", skip(state, path, payload))]
pub async fn update_product(
    State(state): State<ApiState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateProductRequest>, JsonRejection>,
) -> Result<Json<Product>, ErrorResponse> {
    let product_id = path_params(path)?;
    let request = json_body(payload)?;

    let result = state
        .product_service
        .update_product(product_id, request)
        .await;
    state
        .metrics
        .record_product_operation("update", result.is_ok());

    match result {
        Ok(product) => {
            info!(product_id, "Updated product");
            Ok(Json(product))
        }
        Err(err) => {
            warn!(product_id, "Failed to update product: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

#[instrument(name = "admin_delete_product", skip(state, path))]
pub async fn delete_product(
    State(state): State<ApiState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ErrorResponse> {
    let product_id = path_params(path)?;

    let result = state.product_service.delete_product(product_id).await;
    state
        .metrics
        .record_product_operation("delete", result.is_ok());

    match result {
        Ok(()) => {
            info!(product_id, "Deleted product");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(err) => {
            warn!(product_id, "Failed to delete product: {}", err);
            Err(service_error_to_response(err))
        }
    }
}
