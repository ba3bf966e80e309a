use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::models::{
    LoginRequest, LoginResponse, Product, ProductListResponse, RepositoryError, ServiceError,
    SignUpRequest, User,
};
use crate::observability::Metrics;
use crate::repositories::{Database, SqlCartRepository, SqlProductRepository, SqlUserRepository};
use crate::services::{CartService, ProductService, UserService};

/// Error half of every handler result: status plus `{"error", "timestamp"}` body
pub type ErrorResponse = (StatusCode, Json<Value>);

/// Shared application state containing all services
#[derive(Clone)]
pub struct ApiState {
    pub product_service: Arc<ProductService>,
    pub cart_service: Arc<CartService>,
    pub user_service: Arc<UserService>,
    pub database: Database,
    pub metrics: Arc<Metrics>,
}

impl ApiState {
    /// Wire the SQL repositories and services on top of one database handle
    pub fn from_database(database: Database, metrics: Arc<Metrics>) -> Self {
        let product_repository = Arc::new(SqlProductRepository::new(&database));
        let cart_repository = Arc::new(SqlCartRepository::new(&database));
        let user_repository = Arc::new(SqlUserRepository::new(&database));

        Self {
            product_service: Arc::new(ProductService::new(product_repository.clone())),
            cart_service: Arc::new(CartService::new(cart_repository, product_repository)),
            user_service: Arc::new(UserService::new(user_repository)),
            database,
            metrics,
        }
    }
}

// =============================================================================
// PRODUCT ENDPOINTS
// =============================================================================

#[instrument(name = "list_products", skip(state))]
pub async fn list_products(
    State(state): State<ApiState>,
) -> Result<Json<ProductListResponse>, ErrorResponse> {
    let result = state.product_service.list_products().await;
    state.metrics.record_product_operation("list", result.is_ok());

    match result {
        Ok(response) => {
            info!("Listed {} products", response.total_count);
            Ok(Json(response))
        }
        Err(err) => {
            error!("Failed to list products: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

#[instrument(name = "get_product", skip(state, path))]
pub async fn get_product(
    State(state): State<ApiState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Product>, ErrorResponse> {
    let product_id = path_params(path)?;

    let result = state.product_service.get_product(product_id).await;
    state.metrics.record_product_operation("get", result.is_ok());

    match result {
        Ok(product) => Ok(Json(product)),
        Err(err) => {
            warn!(product_id, "Failed to get product: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

// =============================================================================
// USER ENDPOINTS
// =============================================================================

#[instrument(name = "sign_up", skip(state, payload))]
pub async fn sign_up(
    State(state): State<ApiState>,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ErrorResponse> {
    let request = json_body(payload)?;

    let result = state.user_service.sign_up(request).await;
    state.metrics.record_user_operation("sign_up", result.is_ok());

    match result {
        Ok(user) => {
            info!(user_id = user.id, "User registered");
            Ok((StatusCode::CREATED, Json(user)))
        }
        Err(err) => {
            warn!("Sign-up failed: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

#[instrument(name = "login", skip(state, payload))]
pub async fn login(
    State(state): State<ApiState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ErrorResponse> {
    let request = json_body(payload)?;

    let result = state.user_service.login(request).await;
    state.metrics.record_user_operation("login", result.is_ok());

    match result {
        Ok(response) => {
            info!(user_id = response.user.id, "User logged in");
            Ok(Json(response))
        }
        Err(err) => {
            warn!("Login failed: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

#[instrument(name = "get_user", skip(state, path))]
pub async fn get_user(
    State(state): State<ApiState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<User>, ErrorResponse> {
    let user_id = path_params(path)?;

    let result = state.user_service.get_user(user_id).await;
    state.metrics.record_user_operation("get", result.is_ok());

    match result {
        Ok(user) => Ok(Json(user)),
        Err(err) => {
            warn!(user_id, "Failed to get user: {}", err);
            Err(service_error_to_response(err))
        }
    }
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> ErrorResponse {
    (
        status,
        Json(json!({
            "error": message.into(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}

/// Unwrap a JSON body, turning decode failures into the standard error body
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ErrorResponse> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(JsonRejection::MissingJsonContentType(rejection)) => Err(error_response(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            rejection.body_text(),
        )),
        Err(rejection) => {
            warn!("Rejected request body: {}", rejection.body_text());
            Err(error_response(StatusCode::BAD_REQUEST, rejection.body_text()))
        }
    }
}

pub(crate) fn path_params<T>(path: Result<Path<T>, PathRejection>) -> Result<T, ErrorResponse> {
    path.map(|Path(value)| value).map_err(|rejection| {
        warn!("Rejected path parameters: {}", rejection.body_text());
        error_response(StatusCode::BAD_REQUEST, rejection.body_text())
    })
}

/// Convert service errors to HTTP responses
pub fn service_error_to_response(err: ServiceError) -> ErrorResponse {
    let (status, message) = match err {
        ServiceError::ProductNotFound { .. }
        | ServiceError::UserNotFound { .. }
        | ServiceError::CartNotFound { .. }
        | ServiceError::CartItemNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::ValidationError { .. } | ServiceError::InvalidQuantity { .. } => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        ServiceError::ActiveCartExists { .. } | ServiceError::EmailAlreadyRegistered { .. } => {
            (StatusCode::CONFLICT, err.to_string())
        }
        ServiceError::InvalidCredentials => (StatusCode::UNAUTHORIZED, err.to_string()),
        ServiceError::Repository { source } => match source {
            RepositoryError::NotFound { .. } => {
                (StatusCode::NOT_FOUND, "Resource not found".to_string())
            }
            RepositoryError::InvalidArgument { message } => (StatusCode::BAD_REQUEST, message),
            RepositoryError::ConstraintViolation { message } => (StatusCode::CONFLICT, message),
            RepositoryError::ConnectionFailed => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Database connection failed".to_string(),
            ),
            RepositoryError::InvalidData { .. } | RepositoryError::Database { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        },
        ServiceError::Internal { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        ),
    };

    error_response(status, message)
}
