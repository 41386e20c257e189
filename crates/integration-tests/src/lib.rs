//! Integration tests for the Java Cafe storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p javacafe-integration-tests
//! ```
//!
//! The backend is played by a `mockito` server; no running cafe is needed.
//!
//! # Test Categories
//!
//! - `checkout_flow` - Guest and member checkout end to end
//! - `persistence` - Cart and sign-in surviving restarts, cross-writer sync

#![allow(clippy::expect_used, reason = "test support")]

use std::path::Path;
use std::sync::Arc;

use javacafe_storefront::cart::{CartRepository, MemoryCartRepository};
use javacafe_storefront::config::StorefrontConfig;
use javacafe_storefront::session::{MemorySessionStore, SessionStore};
use javacafe_storefront::state::{AppState, Storefront};
use mockito::{Server, ServerGuard};
use serde_json::{Value, json};

/// A mock backend plus the stores a storefront persists into.
pub struct TestContext {
    pub server: ServerGuard,
    pub cart: Arc<dyn CartRepository>,
    pub session: Arc<dyn SessionStore>,
}

impl TestContext {
    /// A backend serving [`sample_menu`] with in-memory stores.
    pub async fn new() -> Self {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/menu")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(sample_menu().to_string())
            .create_async()
            .await;

        Self {
            server,
            cart: Arc::new(MemoryCartRepository::new()),
            session: Arc::new(MemorySessionStore::new()),
        }
    }

    /// Configuration pointing at the mock backend.
    pub fn config(&self) -> StorefrontConfig {
        StorefrontConfig::for_base_url(&self.server.url()).expect("mock server URL is valid")
    }

    /// A storefront on the shared in-memory stores.
    ///
    /// Several storefronts from one context behave like several open tabs.
    pub fn storefront(&self) -> Storefront {
        let state = AppState::new(self.config()).expect("client builds");
        Storefront::with_stores(state, Arc::clone(&self.cart), Arc::clone(&self.session))
            .expect("memory stores open")
    }

    /// A storefront persisting to files in `data_dir`.
    pub fn file_storefront(&self, data_dir: &Path) -> Storefront {
        let mut config = self.config();
        config.data_dir = data_dir.to_path_buf();
        Storefront::open(AppState::new(config).expect("client builds")).expect("data dir opens")
    }
}

/// Latte 4.50, Croissant 3.25, Chocolate Chip 2.00 in stock; Snickerdoodle
/// out of stock.
pub fn sample_menu() -> Value {
    json!([
        {"productId": 5, "category": "COFFEE", "name": "Latte", "basePrice": 4.50, "availability": "IN_STOCK"},
        {"productId": 6, "category": "CROISSANTS", "name": "Croissant", "basePrice": 3.25, "availability": "IN_STOCK"},
        {"productId": 7, "category": "COOKIES", "name": "Chocolate Chip", "basePrice": 2.00, "availability": "IN_STOCK"},
        {"productId": 8, "category": "COOKIES", "name": "Snickerdoodle", "basePrice": 2.25, "availability": "OUT_OF_STOCK"}
    ])
}

/// Body of a successful login for `email`.
pub fn auth_body(token: &str, email: &str) -> String {
    json!({"token": token, "email": email, "firstName": "Ada", "lastName": "Lovelace"}).to_string()
}
