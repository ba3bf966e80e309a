pub mod admin;
pub mod api;
pub mod cart;
pub mod health;
pub mod metrics;
pub mod middleware;

pub use api::{service_error_to_response, ApiState, ErrorResponse};
pub use health::health_check;
pub use metrics::metrics_handler;
pub use middleware::{cors_middleware, request_validation_middleware, security_headers_middleware};

use axum::{
    middleware::from_fn,
    routing::{get, post, put},
    Router,
};
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer};

use crate::config::ServerConfig;
use crate::observability::observability_middleware;

/// Build the full application router
pub fn create_router(state: ApiState, server: &ServerConfig) -> Router {
    let metrics = state.metrics.clone();
    let max_request_size = server.max_request_size;

    Router::new()
        .route("/health/status", get(health_check))
        .route("/metrics", get(metrics_handler))
        // Catalog (read-only)
        .route("/api/products", get(api::list_products))
        .route("/api/products/:product_id", get(api::get_product))
        // Users
        .route("/api/users/signup", post(api::sign_up))
        .route("/api/users/login", post(api::login))
        .route("/api/users/:user_id", get(api::get_user))
        // Carts
        .route(
            "/api/cart/:user_id",
            post(cart::create_cart)
                .get(cart::get_cart)
                .delete(cart::delete_cart),
        )
        .route("/api/cart/:user_id/items", post(cart::add_cart_item))
        .route(
            "/api/cart/:user_id/items/:product_id",
            put(cart::update_cart_item).delete(cart::remove_cart_item),
        )
        .route("/api/cart/:user_id/clear", post(cart::clear_cart))
        .route("/api/cart/:user_id/retire", post(cart::retire_cart))
        // Catalog management
        .route("/api/admin/products", post(admin::create_product))
        .route(
            "/api/admin/products/:product_id",
            put(admin::update_product).delete(admin::delete_product),
        )
        .with_state(state)
        // Middleware layers (last added runs first)
        .layer(RequestBodyLimitLayer::new(max_request_size))
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(from_fn(move |req, next| {
            request_validation_middleware(max_request_size, req, next)
        }))
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(cors_middleware))
        .layer(from_fn(move |req, next| {
            observability_middleware(metrics.clone(), req, next)
        }))
}
