use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Shopping cart owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: i64,
    pub user_id: i64,
    pub total_amount: Decimal,
    pub is_active: bool,
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of a cart. `price` is the unit price captured on first add.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: i64,
    pub cart_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub price: Decimal,
    pub added_at: DateTime<Utc>,
}

/// Request model for adding an item to cart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCartItemRequest {
    pub product_id: i64,
    pub quantity: i32,
    /// Unit price to snapshot. Falls back to the catalog price when absent.
    #[serde(default)]
    pub price: Option<Decimal>,
}

/// Request model for updating cart item quantity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

/// Cart view returned by every successful cart operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartResponse {
    pub cart_id: i64,
    pub user_id: i64,
    pub items: Vec<CartItemResponse>,
    pub total_amount: Decimal,
    pub total_items: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItemResponse {
    pub id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub price: Decimal,
    pub subtotal: Decimal,
}

impl Cart {
    /// Create a new empty, active cart. The id is assigned by the store.
    pub fn new(id: i64, user_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id,
            total_amount: Decimal::ZERO,
            is_active: true,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Sum of quantities, not the number of distinct lines
    pub fn total_items(&self) -> i64 {
        self.items.iter().map(|item| i64::from(item.quantity)).sum()
    }

    /// Total derived from the current items, independent of `total_amount`.
    /// `None` when the sum does not fit in a `Decimal`.
    pub fn computed_total(&self) -> Option<Decimal> {
        items_total(&self.items)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get_item(&self, product_id: i64) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    pub fn contains_item(&self, product_id: i64) -> bool {
        self.get_item(product_id).is_some()
    }

    pub fn to_response(&self) -> CartResponse {
        CartResponse {
            cart_id: self.id,
            user_id: self.user_id,
            items: self.items.iter().map(CartItem::to_response).collect(),
            total_amount: self.total_amount,
            total_items: self.total_items(),
        }
    }
}

/// Sum of quantity × unit price over `items`, or `None` on overflow
pub fn items_total(items: &[CartItem]) -> Option<Decimal> {
    items.iter().try_fold(Decimal::ZERO, |total, item| {
        total.checked_add(item.checked_subtotal()?)
    })
}

impl CartItem {
    /// quantity × unit price, or `None` on overflow
    pub fn checked_subtotal(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }

    /// quantity × unit price, saturating at `Decimal::MAX`
    pub fn subtotal(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.quantity))
    }

    pub fn to_response(&self) -> CartItemResponse {
        CartItemResponse {
            id: self.id,
            product_id: self.product_id,
            quantity: self.quantity,
            price: self.price,
            subtotal: self.subtotal(),
        }
    }
}
