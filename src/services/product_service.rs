use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::{
    CreateProductRequest, Product, ProductListResponse, ServiceError, ServiceResult,
    UpdateProductRequest, Validate,
};
use crate::repositories::ProductRepository;

/// Service for managing catalog products
pub struct ProductService {
    repository: Arc<dyn ProductRepository>,
}

impl ProductService {
    pub fn new(repository: Arc<dyn ProductRepository>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self) -> ServiceResult<ProductListResponse> {
        let products = self.repository.find_all().await?;
        let total_count = products.len();
        Ok(ProductListResponse {
            products,
            total_count,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: i64) -> ServiceResult<Product> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::ProductNotFound { product_id: id })
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_product(&self, request: CreateProductRequest) -> ServiceResult<Product> {
        request.validate()?;

        let product = self.repository.create(request).await?;
        info!(product_id = product.id, "Product created");
        Ok(product)
    }

    #[instrument(skip(self, request))]
    pub async fn update_product(
        &self,
        id: i64,
        request: UpdateProductRequest,
    ) -> ServiceResult<Product> {
        request.validate()?;

        let mut product = self.get_product(id).await?;
        product.apply_update(request);

        self.repository.update(product).await.map_err(|e| {
            if e.is_not_found() {
                ServiceError::ProductNotFound { product_id: id }
            } else {
                e.into()
            }
        })
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: i64) -> ServiceResult<()> {
        self.repository.delete(id).await.map_err(|e| {
            if e.is_not_found() {
                ServiceError::ProductNotFound { product_id: id }
            } else {
                e.into()
            }
        })?;

        info!("Product deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RepositoryError;
    use async_trait::async_trait;
    use chrono::Utc;
    use mockall::{mock, predicate::*};
    use rust_decimal_macros::dec;

    mock! {
        TestProductRepository {}

        #[async_trait]
        impl ProductRepository for TestProductRepository {
            async fn find_all(&self) -> Result<Vec<Product>, RepositoryError>;
            async fn find_by_id(&self, id: i64) -> Result<Option<Product>, RepositoryError>;
            async fn create(&self, request: CreateProductRequest) -> Result<Product, RepositoryError>;
            async fn update(&self, product: Product) -> Result<Product, RepositoryError>;
            async fn delete(&self, id: i64) -> Result<(), RepositoryError>;
        }
    }

    fn create_test_product() -> Product {
        let now = Utc::now();
        Product {
            id: 10,
            name: "Espresso Beans".to_string(),
            description: "Dark roast".to_string(),
            price: dec!(9.99),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_get_product_not_found() {
        let mut mock_repo = MockTestProductRepository::new();
        mock_repo
            .expect_find_by_id()
            .with(eq(10))
            .times(1)
            .returning(|_| Ok(None));

        let result = ProductService::new(Arc::new(mock_repo)).get_product(10).await;
        assert!(matches!(
            result,
            Err(ServiceError::ProductNotFound { product_id: 10 })
        ));
    }

    #[tokio::test]
    async fn test_create_product_validates_first() {
        let mock_repo = MockTestProductRepository::new();

        let request = CreateProductRequest {
            name: "".to_string(),
            description: String::new(),
            price: dec!(1.00),
        };
        let result = ProductService::new(Arc::new(mock_repo))
            .create_product(request)
            .await;

        assert!(matches!(result, Err(ServiceError::ValidationError { .. })));
    }

    #[tokio::test]
    async fn test_update_product_applies_changes() {
        let mut mock_repo = MockTestProductRepository::new();
        mock_repo
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(Some(create_test_product())));
        mock_repo
            .expect_update()
            .withf(|product| product.price == dec!(12.00) && product.name == "Espresso Beans")
            .times(1)
            .returning(Ok);

        let request = UpdateProductRequest {
            price: Some(dec!(12.00)),
            ..Default::default()
        };
        let product = ProductService::new(Arc::new(mock_repo))
            .update_product(10, request)
            .await
            .unwrap();

        assert_eq!(product.price, dec!(12.00));
    }

    #[tokio::test]
    async fn test_list_products_counts() {
        let mut mock_repo = MockTestProductRepository::new();
        mock_repo
            .expect_find_all()
            .times(1)
            .returning(|| Ok(vec![create_test_product(), create_test_product()]));

        let response = ProductService::new(Arc::new(mock_repo))
            .list_products()
            .await
            .unwrap();
        assert_eq!(response.total_count, 2);
    }

    #[tokio::test]
    async fn test_delete_missing_product() {
        let mut mock_repo = MockTestProductRepository::new();
        mock_repo
            .expect_delete()
            .times(1)
            .returning(|_| Err(RepositoryError::not_found("product 3")));

        let result = ProductService::new(Arc::new(mock_repo))
            .delete_product(3)
            .await;
        assert!(matches!(
            result,
            Err(ServiceError::ProductNotFound { product_id: 3 })
        ));
    }
}
