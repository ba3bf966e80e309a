use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnection, SqlitePool, SqliteRow};
use sqlx::Row;
use tracing::{debug, info, instrument};

use super::database::{parse_decimal, Database};
use crate::models::{items_total, Cart, CartItem, RepositoryError, RepositoryResult};

const CART_COLUMNS: &str = "id, user_id, total_amount, is_active, created_at, updated_at";
const ITEM_COLUMNS: &str = "id, cart_id, product_id, quantity, price, added_at";

/// Cart persistence: carts, their items and the derived total.
///
/// Every mutating operation runs in one transaction whose first statement
/// writes the cart row, so concurrent mutations of the same cart are
/// serialized by the store. Each of them ends by recomputing the total from
/// the items it left behind. Item mutations only apply to active carts.
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Create an empty, active cart. Fails with `ConstraintViolation` while
    /// the user already has an active cart.
    async fn create_cart(&self, user_id: i64) -> RepositoryResult<Cart>;

    /// The user's active cart with all of its items
    async fn get_active_cart(&self, user_id: i64) -> RepositoryResult<Cart>;

    /// Items of a cart in insertion order
    async fn get_cart_items(&self, cart_id: i64) -> RepositoryResult<Vec<CartItem>>;

    /// Add `quantity` of a product. An existing line for the product keeps its
    /// original unit price and has the quantities summed.
    async fn add_item(
        &self,
        cart_id: i64,
        product_id: i64,
        quantity: i32,
        price: Decimal,
    ) -> RepositoryResult<CartItem>;

    /// Replace the quantity of an existing line
    async fn update_item(
        &self,
        cart_id: i64,
        product_id: i64,
        quantity: i32,
    ) -> RepositoryResult<CartItem>;

    async fn remove_item(&self, cart_id: i64, product_id: i64) -> RepositoryResult<()>;

    /// Remove every item and reset the total. Clearing an empty cart succeeds.
    async fn clear_cart(&self, cart_id: i64) -> RepositoryResult<()>;

    /// Delete the cart and all of its items
    async fn delete_cart(&self, cart_id: i64) -> RepositoryResult<()>;

    /// Flip an active cart to inactive. The row and its items are kept.
    async fn retire_cart(&self, cart_id: i64) -> RepositoryResult<()>;

    /// Recompute the total from the current items and persist it
    async fn recompute_total(&self, cart_id: i64) -> RepositoryResult<Decimal>;
}

/// SQL implementation of the CartRepository trait
#[derive(Debug, Clone)]
pub struct SqlCartRepository {
    pool: SqlitePool,
}

impl SqlCartRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            pool: database.pool().clone(),
        }
    }
}

fn cart_not_found(cart_id: i64) -> RepositoryError {
    RepositoryError::not_found(format!("cart {}", cart_id))
}

fn active_cart_not_found(cart_id: i64) -> RepositoryError {
    RepositoryError::not_found(format!("active cart {}", cart_id))
}

fn item_not_found(cart_id: i64, product_id: i64) -> RepositoryError {
    RepositoryError::not_found(format!("product {} in cart {}", product_id, cart_id))
}

fn ensure_positive_quantity(quantity: i32) -> RepositoryResult<()> {
    if quantity <= 0 {
        return Err(RepositoryError::invalid_argument(format!(
            "quantity must be positive, got {}",
            quantity
        )));
    }
    Ok(())
}

fn cart_from_row(row: &SqliteRow) -> RepositoryResult<Cart> {
    let total: String = row.try_get("total_amount")?;
    Ok(Cart {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        total_amount: parse_decimal("total_amount", &total)?,
        is_active: row.try_get("is_active")?,
        items: Vec::new(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn cart_item_from_row(row: &SqliteRow) -> RepositoryResult<CartItem> {
    let price: String = row.try_get("price")?;
    let quantity: i64 = row.try_get("quantity")?;
    let quantity = i32::try_from(quantity).map_err(|_| RepositoryError::InvalidData {
        message: format!("quantity out of range: {}", quantity),
    })?;

    Ok(CartItem {
        id: row.try_get("id")?,
        cart_id: row.try_get("cart_id")?,
        product_id: row.try_get("product_id")?,
        quantity,
        price: parse_decimal("price", &price)?,
        added_at: row.try_get("added_at")?,
    })
}

/// Take the write lock on the cart by touching its row. Retired carts are
/// read-only, so only an active cart matches.
async fn lock_cart(
    conn: &mut SqliteConnection,
    cart_id: i64,
    now: DateTime<Utc>,
) -> RepositoryResult<()> {
    let result = sqlx::query("UPDATE carts SET updated_at = ? WHERE id = ? AND is_active = 1")
        .bind(now)
        .bind(cart_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(active_cart_not_found(cart_id));
    }
    Ok(())
}

async fn fetch_item(
    conn: &mut SqliteConnection,
    cart_id: i64,
    product_id: i64,
) -> RepositoryResult<Option<CartItem>> {
    let sql = format!(
        "SELECT {} FROM cart_items WHERE cart_id = ? AND product_id = ?",
        ITEM_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(cart_id)
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(cart_item_from_row).transpose()
}

async fn fetch_items(conn: &mut SqliteConnection, cart_id: i64) -> RepositoryResult<Vec<CartItem>> {
    let sql = format!(
        "SELECT {} FROM cart_items WHERE cart_id = ? ORDER BY id",
        ITEM_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(cart_id)
        .fetch_all(&mut *conn)
        .await?;

    rows.iter().map(cart_item_from_row).collect()
}

/// Sum quantity × price over the current items and store it on the cart.
/// A total that does not fit in a `Decimal` is rejected, and the caller's
/// transaction is dropped with nothing written.
async fn write_total(conn: &mut SqliteConnection, cart_id: i64) -> RepositoryResult<Decimal> {
    let items = fetch_items(conn, cart_id).await?;
    let total = items_total(&items).ok_or_else(|| {
        RepositoryError::invalid_argument(format!("total of cart {} overflows", cart_id))
    })?;

    sqlx::query("UPDATE carts SET total_amount = ? WHERE id = ?")
        .bind(total.to_string())
        .bind(cart_id)
        .execute(&mut *conn)
        .await?;

    debug!(cart_id, %total, "Cart total recomputed");
    Ok(total)
}

/// Set the quantity of an existing line, then recompute the total
async fn write_quantity(
    conn: &mut SqliteConnection,
    cart_id: i64,
    product_id: i64,
    quantity: i32,
) -> RepositoryResult<CartItem> {
    let result =
        sqlx::query("UPDATE cart_items SET quantity = ? WHERE cart_id = ? AND product_id = ?")
            .bind(quantity)
            .bind(cart_id)
            .bind(product_id)
            .execute(&mut *conn)
            .await?;

    if result.rows_affected() == 0 {
        return Err(item_not_found(cart_id, product_id));
    }

    let item = fetch_item(conn, cart_id, product_id)
        .await?
        .ok_or_else(|| item_not_found(cart_id, product_id))?;
    write_total(conn, cart_id).await?;
    Ok(item)
}

#[async_trait]
impl CartRepository for SqlCartRepository {
    #[instrument(skip(self))]
    async fn create_cart(&self, user_id: i64) -> RepositoryResult<Cart> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO carts (user_id, total_amount, is_active, created_at, updated_at) \
             VALUES (?, '0', 1, ?, ?)",
        )
        .bind(user_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match RepositoryError::from(e) {
            RepositoryError::ConstraintViolation { .. } => RepositoryError::ConstraintViolation {
                message: format!("user {} already has an active cart", user_id),
            },
            other => other,
        })?;

        let mut cart = Cart::new(result.last_insert_rowid(), user_id);
        cart.created_at = now;
        cart.updated_at = now;

        info!(cart_id = cart.id, "Cart created");
        Ok(cart)
    }

    #[instrument(skip(self))]
    async fn get_active_cart(&self, user_id: i64) -> RepositoryResult<Cart> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT {} FROM carts WHERE user_id = ? AND is_active = 1",
            CART_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| RepositoryError::not_found(format!("active cart for user {}", user_id)))?;

        let mut cart = cart_from_row(&row)?;
        cart.items = fetch_items(&mut tx, cart.id).await?;
        tx.commit().await?;

        debug!(cart_id = cart.id, item_count = cart.items.len(), "Active cart loaded");
        Ok(cart)
    }

    #[instrument(skip(self))]
    async fn get_cart_items(&self, cart_id: i64) -> RepositoryResult<Vec<CartItem>> {
        let mut conn = self.pool.acquire().await?;
        fetch_items(&mut conn, cart_id).await
    }

    #[instrument(skip(self))]
    async fn add_item(
        &self,
        cart_id: i64,
        product_id: i64,
        quantity: i32,
        price: Decimal,
    ) -> RepositoryResult<CartItem> {
        ensure_positive_quantity(quantity)?;
        if price <= Decimal::ZERO {
            return Err(RepositoryError::invalid_argument(format!(
                "price must be positive, got {}",
                price
            )));
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        lock_cart(&mut tx, cart_id, now).await?;

        let item = match fetch_item(&mut tx, cart_id, product_id).await? {
            Some(existing) => {
                let merged = existing.quantity.checked_add(quantity).ok_or_else(|| {
                    RepositoryError::invalid_argument(format!(
                        "quantity {} + {} overflows",
                        existing.quantity, quantity
                    ))
                })?;
                debug!(from = existing.quantity, to = merged, "Merging into existing line");
                write_quantity(&mut tx, cart_id, product_id, merged).await?
            }
            None => {
                let result = sqlx::query(
                    "INSERT INTO cart_items (cart_id, product_id, quantity, price, added_at) \
                     VALUES (?, ?, ?, ?, ?)",
                )
                .bind(cart_id)
                .bind(product_id)
                .bind(quantity)
                .bind(price.to_string())
                .bind(now)
                .execute(&mut *tx)
                .await?;

                write_total(&mut tx, cart_id).await?;
                CartItem {
                    id: result.last_insert_rowid(),
                    cart_id,
                    product_id,
                    quantity,
                    price,
                    added_at: now,
                }
            }
        };

        tx.commit().await?;
        info!(item_id = item.id, quantity = item.quantity, "Item added to cart");
        Ok(item)
    }

    #[instrument(skip(self))]
    async fn update_item(
        &self,
        cart_id: i64,
        product_id: i64,
        quantity: i32,
    ) -> RepositoryResult<CartItem> {
        ensure_positive_quantity(quantity)?;

        let mut tx = self.pool.begin().await?;
        lock_cart(&mut tx, cart_id, Utc::now()).await?;
        let item = write_quantity(&mut tx, cart_id, product_id, quantity).await?;
        tx.commit().await?;

        info!("Cart item updated");
        Ok(item)
    }

    #[instrument(skip(self))]
    async fn remove_item(&self, cart_id: i64, product_id: i64) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await?;
        lock_cart(&mut tx, cart_id, Utc::now()).await?;

        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = ? AND product_id = ?")
            .bind(cart_id)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(item_not_found(cart_id, product_id));
        }

        write_total(&mut tx, cart_id).await?;
        tx.commit().await?;

        info!("Item removed from cart");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear_cart(&self, cart_id: i64) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await?;
        lock_cart(&mut tx, cart_id, Utc::now()).await?;

        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = ?")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        write_total(&mut tx, cart_id).await?;
        tx.commit().await?;

        info!(removed = result.rows_affected(), "Cart cleared");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_cart(&self, cart_id: i64) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM cart_items WHERE cart_id = ?")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM carts WHERE id = ?")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(cart_not_found(cart_id));
        }

        tx.commit().await?;
        info!("Cart deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn retire_cart(&self, cart_id: i64) -> RepositoryResult<()> {
        let result = sqlx::query(
            "UPDATE carts SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1",
        )
        .bind(Utc::now())
        .bind(cart_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(active_cart_not_found(cart_id));
        }

        info!("Cart retired");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn recompute_total(&self, cart_id: i64) -> RepositoryResult<Decimal> {
        let mut tx = self.pool.begin().await?;
        lock_cart(&mut tx, cart_id, Utc::now()).await?;
        let total = write_total(&mut tx, cart_id).await?;
        tx.commit().await?;
        Ok(total)
    }
}
