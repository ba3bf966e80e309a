use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::Json,
};
use tracing::{info, instrument, warn};

use super::api::{json_body, path_params, service_error_to_response, ApiState, ErrorResponse};
use crate::models::{AddCartItemRequest, CartResponse, ServiceResult, UpdateCartItemRequest};

/// Record the outcome of a cart operation and turn failures into responses
fn finish<T>(
    state: &ApiState,
    operation: &str,
    result: ServiceResult<T>,
) -> Result<T, ErrorResponse> {
    state.metrics.record_cart_operation(operation, result.is_ok());

    result.map_err(|err| {
        warn!(operation, "Cart operation failed: {}", err);
        service_error_to_response(err)
    })
}

/// Open a new cart for the user
#[instrument(name = "create_cart", skip(state, path))]
pub async fn create_cart(
    State(state): State<ApiState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<(StatusCode, Json<CartResponse>), ErrorResponse> {
    let user_id = path_params(path)?;

    let cart = finish(
        &state,
        "create_cart",
        state.cart_service.create_cart(user_id).await,
    )?;
    info!(user_id, cart_id = cart.cart_id, "Cart created");
    Ok((StatusCode::CREATED, Json(cart)))
}

/// Get a user's active cart
#[instrument(name = "get_cart", skip(state, path))]
pub async fn get_cart(
    State(state): State<ApiState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<CartResponse>, ErrorResponse> {
    let user_id = path_params(path)?;

    let cart = finish(&state, "get_cart", state.cart_service.get_cart(user_id).await)?;
    info!(user_id, "Retrieved cart with {} items", cart.total_items);
    Ok(Json(cart))
}

/// Add an item to the cart, merging with an existing line for the product
#[instrument(name = "add_cart_item", skip(state, path, payload))]
pub async fn add_cart_item(
    State(state): State<ApiState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<AddCartItemRequest>, JsonRejection>,
) -> Result<Json<CartResponse>, ErrorResponse> {
    let user_id = path_params(path)?;
    let request = json_body(payload)?;
    let product_id = request.product_id;

    let cart = finish(
        &state,
        "add_item",
        state.cart_service.add_item(user_id, request).await,
    )?;
    info!(user_id, product_id, "Added item to cart");
    Ok(Json(cart))
}

#[instrument(name = "update_cart_item", skip(state, path, payload))]
pub async fn update_cart_item(
    State(state): State<ApiState>,
    path: Result<Path<(i64, i64)>, PathRejection>,
    payload: Result<Json<UpdateCartItemRequest>, JsonRejection>,
) -> Result<Json<CartResponse>, ErrorResponse> {
    let (user_id, product_id) = path_params(path)?;
    let request = json_body(payload)?;

    let cart = finish(
        &state,
        "update_item",
        state
            .cart_service
            .update_item(user_id, product_id, request)
            .await,
    )?;
    info!(user_id, product_id, "Updated cart item");
    Ok(Json(cart))
}

#[instrument(name = "remove_cart_item", skip(state, path))]
pub async fn remove_cart_item(
    State(state): State<ApiState>,
    path: Result<Path<(i64, i64)>, PathRejection>,
) -> Result<Json<CartResponse>, ErrorResponse> {
    let (user_id, product_id) = path_params(path)?;

    let cart = finish(
        &state,
        "remove_item",
        state.cart_service.remove_item(user_id, product_id).await,
    )?;
    info!(user_id, product_id, "Removed item from cart");
    Ok(Json(cart))
}

#[instrument(name = "clear_cart", skip(state, path))]
pub async fn clear_cart(
    State(state): State<ApiState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<CartResponse>, ErrorResponse> {
    let user_id = path_params(path)?;

    let cart = finish(
        &state,
        "clear_cart",
        state.cart_service.clear_cart(user_id).await,
    )?;
    info!(user_id, "Cleared cart");
    Ok(Json(cart))
}

/// Delete the active cart together with its items
#[instrument(name = "delete_cart", skip(state, path))]
pub async fn delete_cart(
    State(state): State<ApiState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ErrorResponse> {
    let user_id = path_params(path)?;

    finish(
        &state,
        "delete_cart",
        state.cart_service.delete_cart(user_id).await,
    )?;
    info!(user_id, "Deleted cart");
    Ok(StatusCode::NO_CONTENT)
}

/// Retire the active cart so a fresh one can be opened
#[instrument(name = "retire_cart", skip(state, path))]
pub async fn retire_cart(
    State(state): State<ApiState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ErrorResponse> {
    let user_id = path_params(path)?;

    finish(
        &state,
        "retire_cart",
        state.cart_service.retire_cart(user_id).await,
    )?;
    info!(user_id, "Retired cart");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::config::ServerConfig;
    use crate::handlers::{create_router, ApiState};
    use crate::observability::Metrics;
    use crate::repositories::Database;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use rust_decimal::Decimal;
    use serde_json::{json, Value};
    use std::str::FromStr;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn test_app() -> Router {
        let database = Database::connect_in_memory().await.unwrap();
        let metrics = Arc::new(Metrics::new().unwrap());
        create_router(
            ApiState::from_database(database, metrics),
            &ServerConfig::default(),
        )
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn decimal(value: &Value) -> Decimal {
        Decimal::from_str(&value.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_cart_lifecycle() {
        let app = test_app().await;

        let (status, cart) = send(&app, "POST", "/api/cart/7", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(cart["user_id"], 7);
        assert_eq!(cart["items"], json!([]));
        assert_eq!(decimal(&cart["total_amount"]), Decimal::ZERO);

        let (status, _) = send(&app, "POST", "/api/cart/7", None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, cart) = send(
            &app,
            "POST",
            "/api/cart/7/items",
            Some(json!({"product_id": 10, "quantity": 2, "price": 9.99})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cart["total_items"], 2);

        let (_, cart) = send(
            &app,
            "POST",
            "/api/cart/7/items",
            Some(json!({"product_id": 10, "quantity": 3, "price": 5.00})),
        )
        .await;
        assert_eq!(cart["items"].as_array().unwrap().len(), 1);
        assert_eq!(cart["items"][0]["quantity"], 5);
        assert_eq!(decimal(&cart["items"][0]["price"]), Decimal::new(999, 2));
        assert_eq!(decimal(&cart["total_amount"]), Decimal::new(4995, 2));

        let (status, cart) = send(&app, "POST", "/api/cart/7/clear", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cart["total_items"], 0);

        let (status, _) = send(&app, "POST", "/api/cart/7/retire", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, "GET", "/api/cart/7", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "POST", "/api/cart/7", None).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = send(&app, "DELETE", "/api/cart/7", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_update_and_remove_items() {
        let app = test_app().await;
        send(&app, "POST", "/api/cart/3", None).await;
        send(
            &app,
            "POST",
            "/api/cart/3/items",
            Some(json!({"product_id": 1, "quantity": 1, "price": 4.50})),
        )
        .await;

        let (status, cart) = send(
            &app,
            "PUT",
            "/api/cart/3/items/1",
            Some(json!({"quantity": 4})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(decimal(&cart["total_amount"]), Decimal::new(1800, 2));

        let (status, _) = send(
            &app,
            "PUT",
            "/api/cart/3/items/1",
            Some(json!({"quantity": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "DELETE", "/api/cart/3/items/2", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, cart) = send(&app, "DELETE", "/api/cart/3/items/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cart["items"], json!([]));
    }

    #[tokio::test]
    async fn test_add_without_price_uses_catalog_price() {
        let app = test_app().await;
        let (_, product) = send(
            &app,
            "POST",
            "/api/admin/products",
            Some(json!({"name": "Leash", "price": 15.25})),
        )
        .await;
        let product_id = product["id"].as_i64().unwrap();

        send(&app, "POST", "/api/cart/5", None).await;
        let (status, cart) = send(
            &app,
            "POST",
            "/api/cart/5/items",
            Some(json!({"product_id": product_id, "quantity": 2})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(decimal(&cart["total_amount"]), Decimal::new(3050, 2));

        let (status, _) = send(
            &app,
            "POST",
            "/api/cart/5/items",
            Some(json!({"product_id": 4242, "quantity": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_add_to_missing_cart_is_not_found() {
        let app = test_app().await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/cart/99/items",
            Some(json!({"product_id": 1, "quantity": 1, "price": 1.00})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());
        assert!(body.get("items").is_none());
    }

    #[tokio::test]
    async fn test_overflowing_total_is_bad_request() {
        let app = test_app().await;
        send(&app, "POST", "/api/cart/6", None).await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/cart/6/items",
            Some(json!({"product_id": 10, "quantity": 1_000_000_000, "price": 1e20})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, cart) = send(&app, "GET", "/api/cart/6", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cart["items"], json!([]));
        assert_eq!(decimal(&cart["total_amount"]), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_invalid_quantity_on_add() {
        let app = test_app().await;
        send(&app, "POST", "/api/cart/4", None).await;

        let (status, _) = send(
            &app,
            "POST",
            "/api/cart/4/items",
            Some(json!({"product_id": 1, "quantity": -2, "price": 1.00})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
