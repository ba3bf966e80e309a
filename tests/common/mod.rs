use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};
use storefront_rs::config::ServerConfig;
use storefront_rs::{create_router, ApiState, Database, Metrics};
use tokio::net::TcpListener;

/// The real application on an ephemeral port, backed by a private in-memory database
pub struct TestEnvironment {
    pub client: Client,
    pub base_url: String,
}

impl TestEnvironment {
    pub async fn new() -> Self {
        let database = Database::connect_in_memory()
            .await
            .expect("Failed to open in-memory database");
        let metrics = Arc::new(Metrics::new().expect("Failed to register metrics"));
        let app = create_router(
            ApiState::from_database(database, metrics),
            &ServerConfig::default(),
        );

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind listener");
        let addr = listener.local_addr().expect("Failed to get local address");
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Failed to serve app");
        });

        // Wait for server to start
        tokio::time::sleep(Duration::from_millis(100)).await;

        let client = Client::new();

        Self { client, base_url }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Create a catalog product and return its id
    pub async fn create_product(&self, name: &str, price: f64) -> i64 {
        let response = self
            .client
            .post(self.url("/api/admin/products"))
            .json(&json!({ "name": name, "price": price }))
            .send()
            .await
            .expect("Failed to create product");
        assert_eq!(response.status().as_u16(), 201);

        let product: Value = response.json().await.expect("Failed to parse product");
        product["id"].as_i64().expect("product id")
    }

    pub async fn create_cart(&self, user_id: i64) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/api/cart/{}", user_id)))
            .send()
            .await
            .expect("Failed to create cart")
    }

    pub async fn add_item(&self, user_id: i64, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/api/cart/{}/items", user_id)))
            .json(&body)
            .send()
            .await
            .expect("Failed to add item")
    }
}
