use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Catalog product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request model for creating a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
}

/// Request model for updating a product
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
}

/// Response model for product listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    pub total_count: usize,
}

impl Product {
    /// Apply the present fields of an update request
    pub fn apply_update(&mut self, request: UpdateProductRequest) {
        if let Some(name) = request.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = request.description {
            self.description = description;
        }
        if let Some(price) = request.price {
            self.price = price;
        }
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_product() -> Product {
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

    #[test]
    fn test_apply_partial_update() {
        let mut product = sample_product();
        product.apply_update(UpdateProductRequest {
            price: Some(dec!(11.50)),
            ..Default::default()
        });

        assert_eq!(product.name, "Espresso Beans");
        assert_eq!(product.price, dec!(11.50));
        assert!(product.updated_at >= product.created_at);
    }

    #[test]
    fn test_create_request_description_defaults_to_empty() {
        let request: CreateProductRequest =
            serde_json::from_str(r#"{"name": "Mug", "price": 4.5}"#).unwrap();
        assert_eq!(request.description, "");
        assert_eq!(request.price, dec!(4.5));
    }
}
