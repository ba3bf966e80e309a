use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use tracing::{info, instrument};

use super::database::{parse_decimal, Database};
use crate::models::{CreateProductRequest, Product, RepositoryError, RepositoryResult};

/// Trait defining the interface for product catalog access
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// All products ordered by id
    async fn find_all(&self) -> RepositoryResult<Vec<Product>>;

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Product>>;

    async fn create(&self, request: CreateProductRequest) -> RepositoryResult<Product>;

    /// Overwrite name, description and price of an existing product
    async fn update(&self, product: Product) -> RepositoryResult<Product>;

    async fn delete(&self, id: i64) -> RepositoryResult<()>;
}

/// SQL implementation of the ProductRepository trait
#[derive(Debug, Clone)]
pub struct SqlProductRepository {
    pool: SqlitePool,
}

impl SqlProductRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            pool: database.pool().clone(),
        }
    }
}

fn product_from_row(row: &SqliteRow) -> RepositoryResult<Product> {
    let price: String = row.try_get("price")?;
    Ok(Product {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: parse_decimal("price", &price)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl ProductRepository for SqlProductRepository {
    #[instrument(skip(self))]
    async fn find_all(&self) -> RepositoryResult<Vec<Product>> {
        let rows = sqlx::query(
            "SELECT id, name, description, price, created_at, updated_at FROM products ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        let products = rows
            .iter()
            .map(product_from_row)
            .collect::<RepositoryResult<Vec<_>>>()?;

        info!("Found {} products", products.len());
        Ok(products)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, name, description, price, created_at, updated_at FROM products WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(product_from_row).transpose()
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    async fn create(&self, request: CreateProductRequest) -> RepositoryResult<Product> {
        let now = Utc::now();
        let name = request.name.trim().to_string();

        let result = sqlx::query(
            "INSERT INTO products (name, description, price, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&name)
        .bind(&request.description)
        .bind(request.price.to_string())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let product = Product {
            id: result.last_insert_rowid(),
            name,
            description: request.description,
            price: request.price,
            created_at: now,
            updated_at: now,
        };

        info!(product_id = product.id, "Product created");
        Ok(product)
    }

    #[instrument(skip(self, product), fields(product_id = product.id))]
    async fn update(&self, product: Product) -> RepositoryResult<Product> {
        let result = sqlx::query(
            "UPDATE products SET name = ?, description = ?, price = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.to_string())
        .bind(product.updated_at)
        .bind(product.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found(format!("product {}", product.id)));
        }

        info!("Product updated");
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found(format!("product {}", id)));
        }

        info!("Product deleted");
        Ok(())
    }
}
