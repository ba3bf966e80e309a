use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::{
    AddCartItemRequest, Cart, CartResponse, RepositoryError, ServiceError, ServiceResult,
    UpdateCartItemRequest, Validate,
};
use crate::repositories::{CartRepository, ProductRepository};

/// Service for managing shopping carts
pub struct CartService {
    cart_repository: Arc<dyn CartRepository>,
    product_repository: Arc<dyn ProductRepository>,
}

impl CartService {
    pub fn new(
        cart_repository: Arc<dyn CartRepository>,
        product_repository: Arc<dyn ProductRepository>,
    ) -> Self {
        Self {
            cart_repository,
            product_repository,
        }
    }

    /// Open a new cart for the user
    #[instrument(skip(self))]
    pub async fn create_cart(&self, user_id: i64) -> ServiceResult<CartResponse> {
        validate_user_id(user_id)?;

        let cart = self
            .cart_repository
            .create_cart(user_id)
            .await
            .map_err(|e| match e {
                RepositoryError::ConstraintViolation { .. } => {
                    ServiceError::ActiveCartExists { user_id }
                }
                other => other.into(),
            })?;

        info!(cart_id = cart.id, "Cart opened");
        Ok(cart.to_response())
    }

    #[instrument(skip(self))]
    pub async fn get_cart(&self, user_id: i64) -> ServiceResult<CartResponse> {
        validate_user_id(user_id)?;
        let cart = self.active_cart(user_id).await?;
        Ok(cart.to_response())
    }

    /// Add a product to the user's active cart. Without an explicit price the
    /// current catalog price is snapshotted.
    #[instrument(skip(self, request), fields(product_id = request.product_id, quantity = request.quantity))]
    pub async fn add_item(
        &self,
        user_id: i64,
        request: AddCartItemRequest,
    ) -> ServiceResult<CartResponse> {
        validate_user_id(user_id)?;
        if request.quantity <= 0 {
            return Err(ServiceError::InvalidQuantity {
                quantity: request.quantity,
            });
        }
        request.validate()?;

        let price = self.resolve_price(&request).await?;
        let cart = self.active_cart(user_id).await?;

        self.cart_repository
            .add_item(cart.id, request.product_id, request.quantity, price)
            .await
            .map_err(|e| cart_error(e, user_id))?;

        info!("Item added to cart");
        self.get_cart(user_id).await
    }

    #[instrument(skip(self, request), fields(quantity = request.quantity))]
    pub async fn update_item(
        &self,
        user_id: i64,
        product_id: i64,
        request: UpdateCartItemRequest,
    ) -> ServiceResult<CartResponse> {
        validate_user_id(user_id)?;
        if request.quantity <= 0 {
            return Err(ServiceError::InvalidQuantity {
                quantity: request.quantity,
            });
        }

        let cart = self.active_cart(user_id).await?;
        self.cart_repository
            .update_item(cart.id, product_id, request.quantity)
            .await
            .map_err(|e| item_error(e, user_id, product_id))?;

        info!("Cart item updated");
        self.get_cart(user_id).await
    }

    #[instrument(skip(self))]
    pub async fn remove_item(&self, user_id: i64, product_id: i64) -> ServiceResult<CartResponse> {
        validate_user_id(user_id)?;

        let cart = self.active_cart(user_id).await?;
        self.cart_repository
            .remove_item(cart.id, product_id)
            .await
            .map_err(|e| item_error(e, user_id, product_id))?;

        info!("Item removed from cart");
        self.get_cart(user_id).await
    }

    #[instrument(skip(self))]
    pub async fn clear_cart(&self, user_id: i64) -> ServiceResult<CartResponse> {
        validate_user_id(user_id)?;

        let cart = self.active_cart(user_id).await?;
        self.cart_repository
            .clear_cart(cart.id)
            .await
            .map_err(|e| cart_error(e, user_id))?;

        info!("Cart cleared");
        self.get_cart(user_id).await
    }

    /// Delete the active cart and all of its items
    #[instrument(skip(self))]
    pub async fn delete_cart(&self, user_id: i64) -> ServiceResult<()> {
        validate_user_id(user_id)?;

        let cart = self.active_cart(user_id).await?;
        self.cart_repository
            .delete_cart(cart.id)
            .await
            .map_err(|e| cart_error(e, user_id))?;

        info!(cart_id = cart.id, "Cart deleted");
        Ok(())
    }

    /// Retire the active cart; a later `create_cart` opens a fresh one
    #[instrument(skip(self))]
    pub async fn retire_cart(&self, user_id: i64) -> ServiceResult<()> {
        validate_user_id(user_id)?;

        let cart = self.active_cart(user_id).await?;
        self.cart_repository
            .retire_cart(cart.id)
            .await
            .map_err(|e| cart_error(e, user_id))?;

        info!(cart_id = cart.id, "Cart retired");
        Ok(())
    }

    async fn active_cart(&self, user_id: i64) -> ServiceResult<Cart> {
        self.cart_repository
            .get_active_cart(user_id)
            .await
            .map_err(|e| cart_error(e, user_id))
    }

    async fn resolve_price(&self, request: &AddCartItemRequest) -> ServiceResult<Decimal> {
        if let Some(price) = request.price {
            return Ok(price);
        }

        self.product_repository
            .find_by_id(request.product_id)
            .await?
            .map(|product| product.price)
            .ok_or(ServiceError::ProductNotFound {
                product_id: request.product_id,
            })
    }
}

fn validate_user_id(user_id: i64) -> ServiceResult<()> {
    crate::models::validate_id("user_id", user_id)?;
    Ok(())
}

fn cart_error(error: RepositoryError, user_id: i64) -> ServiceError {
    if error.is_not_found() {
        ServiceError::CartNotFound { user_id }
    } else {
        error.into()
    }
}

fn item_error(error: RepositoryError, user_id: i64, product_id: i64) -> ServiceError {
    if error.is_not_found() {
        ServiceError::CartItemNotFound {
            product_id,
            user_id,
        }
    } else {
        error.into()
    }
}
