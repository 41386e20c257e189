//! Java Cafe REST API client.
//!
//! # Architecture
//!
//! - Plain JSON over HTTP with `reqwest`; the backend is the source of truth
//! - In-memory caching via `moka` for the menu and product descriptions
//! - No retries: every retry is a manual repeat by the user
//!
//! # Endpoints
//!
//! - `GET /api/menu`, `GET /api/menu/description/{id}`
//! - `POST /api/auth/login`, `POST /api/auth/register`
//! - `POST /api/cart/guest/submit`, member submit (bearer token)
//! - `POST /api/contact/submit`
//!
//! # Example
//!
//! ```rust,ignore
//! use javacafe_storefront::api::CafeClient;
//!
//! let client = CafeClient::new(&config)?;
//! let menu = client.list_menu().await?;
//! let auth = client.login("a@b.com", &password).await?;
//! ```

mod cache;
pub mod types;

use std::sync::Arc;

use moka::future::Cache;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use javacafe_core::ProductId;

use crate::config::StorefrontConfig;

use cache::{CacheKey, CacheValue};
pub use types::*;

/// Longest slice of an error body kept for messages.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Errors that can occur when talking to the cafe backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (connection refused, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the bearer token (HTTP 401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Any other non-success status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body could not be interpreted.
    #[error("Parse error: {0}")]
    Parse(String),

    /// An endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// Whether the error means the session token is no longer valid.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Text suitable for showing to the user.
    ///
    /// Backend error bodies are shown when present, like the order pages do;
    /// transport details are not.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Http(e) if e.is_timeout() => "The cafe took too long to respond.".to_string(),
            Self::Http(_) => "Could not reach the cafe. Please try again.".to_string(),
            Self::Unauthorized(_) => "Session expired. Please login again.".to_string(),
            Self::Status { status, message } if message.is_empty() => format!("HTTP {status}"),
            Self::Status { message, .. } => message.clone(),
            Self::Parse(_) | Self::InvalidUrl(_) => {
                "Unexpected response from the cafe.".to_string()
            }
        }
    }
}

// =============================================================================
// CafeClient
// =============================================================================

/// Client for the cafe backend.
///
/// Cheap to clone; clones share the HTTP connection pool and the cache.
#[derive(Clone)]
pub struct CafeClient {
    inner: Arc<CafeClientInner>,
}

struct CafeClientInner {
    client: reqwest::Client,
    base_url: Url,
    member_order_path: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl CafeClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        let cache = Cache::builder()
            .max_capacity(500)
            .time_to_live(config.menu_cache_ttl)
            .build();

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: Arc::new(CafeClientInner {
                client: builder.build()?,
                base_url: config.api_base_url.clone(),
                member_order_path: config.member_order_path.clone(),
                cache,
            }),
        })
    }

    /// The backend base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    // =========================================================================
    // Menu
    // =========================================================================

    /// List every product on the menu.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body is not a product list.
    #[instrument(skip(self))]
    pub async fn list_menu(&self) -> Result<Vec<MenuProduct>, ApiError> {
        if let Some(CacheValue::Menu(products)) = self.inner.cache.get(&CacheKey::Menu).await {
            debug!("Cache hit for menu");
            return Ok(products);
        }

        let url = self.endpoint("/api/menu")?;
        let response = self.inner.client.get(url).send().await?;
        let products: Vec<MenuProduct> = read_json(response).await?;

        debug!(count = products.len(), "Fetched menu");
        self.inner
            .cache
            .insert(CacheKey::Menu, CacheValue::Menu(products.clone()))
            .await;

        Ok(products)
    }

    /// Fetch the long description of a product.
    ///
    /// Returns `Ok(None)` when the backend has no description text.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails; callers fall back to a generated
    /// description.
    #[instrument(skip(self))]
    pub async fn product_description(&self, id: ProductId) -> Result<Option<String>, ApiError> {
        let key = CacheKey::Description(id);
        if let Some(CacheValue::Description(text)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for description");
            return Ok(text);
        }

        let url = self.endpoint(&format!("/api/menu/description/{id}"))?;
        let response = self.inner.client.get(url).send().await?;
        let body: ProductDescription = read_json(response).await?;
        let text = body.description.filter(|d| !d.trim().is_empty());

        self.inner
            .cache
            .insert(key, CacheValue::Description(text.clone()))
            .await;

        Ok(text)
    }

    /// Drop all cached menu data.
    pub fn invalidate_cache(&self) {
        self.inner.cache.invalidate_all();
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Exchange credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns error if the credentials are rejected or the request fails.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthResponse, ApiError> {
        let body = LoginRequest {
            email,
            password: password.expose_secret(),
        };
        self.post_json("/api/auth/login", &body, None).await
    }

    /// Create an account and return its bearer token.
    ///
    /// # Errors
    ///
    /// Returns error if registration is rejected or the request fails.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        email: &str,
        password: &SecretString,
        first_name: &str,
        last_name: &str,
    ) -> Result<AuthResponse, ApiError> {
        let body = RegisterRequest {
            email,
            password: password.expose_secret(),
            first_name,
            last_name,
        };
        self.post_json("/api/auth/register", &body, None).await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Submit an order with one-off guest details.
    ///
    /// # Errors
    ///
    /// Returns error if the backend rejects the order or the request fails.
    #[instrument(skip(self, order), fields(items = order.items.len()))]
    pub async fn submit_guest_order(
        &self,
        order: &GuestOrderRequest,
    ) -> Result<OrderReceipt, ApiError> {
        let value: serde_json::Value = self.post_json("/api/cart/guest/submit", order, None).await?;
        OrderReceipt::from_value(value)
    }

    /// Submit an order on behalf of the signed-in member.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] if the token is rejected, or another
    /// error if the backend rejects the order or the request fails.
    #[instrument(skip(self, order, token), fields(items = order.items.len()))]
    pub async fn submit_member_order(
        &self,
        order: &MemberOrderRequest,
        token: &SecretString,
    ) -> Result<OrderReceipt, ApiError> {
        let path = self.inner.member_order_path.clone();
        let value: serde_json::Value = self.post_json(&path, order, Some(token)).await?;
        OrderReceipt::from_value(value)
    }

    // =========================================================================
    // Contact
    // =========================================================================

    /// Send a contact form submission.
    ///
    /// # Errors
    ///
    /// Returns error if the backend rejects the submission or the request fails.
    #[instrument(skip(self, form), fields(subject = %form.subject))]
    pub async fn submit_contact(&self, form: &ContactRequest) -> Result<ContactReceipt, ApiError> {
        let url = self.endpoint("/api/contact/submit")?;
        let response = self.inner.client.post(url).json(form).send().await?;
        let response = check_status(response).await?;

        // The submission is accepted even if the echo body is missing or odd.
        let text = response.text().await?;
        Ok(serde_json::from_str(&text).unwrap_or_default())
    }

    /// POST a JSON body, optionally with a bearer token, and decode the reply.
    async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
        token: Option<&SecretString>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let mut request = self.inner.client.post(url).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token.expose_secret());
        }
        let response = request.send().await?;
        read_json(response).await
    }
}

// =============================================================================
// Response handling
// =============================================================================

/// Map non-success statuses to errors, keeping a slice of the body.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect::<String>();

    tracing::warn!(status = %status, body = %message, "Cafe API returned non-success status");

    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized(message));
    }

    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

/// Check the status and decode a JSON body.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let response = check_status(response).await?;
    let text = response.text().await?;

    serde_json::from_str(&text).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %text.chars().take(500).collect::<String>(),
            "Failed to parse cafe API response"
        );
        ApiError::Parse(e.to_string())
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mockito::{Matcher, Server};
    use serde_json::json;

    use super::*;

    fn client_for(server: &Server) -> CafeClient {
        let config = StorefrontConfig::for_base_url(&server.url()).unwrap();
        CafeClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_list_menu_is_cached() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/menu")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!([
                    {"productId": 5, "category": "COFFEE", "name": "Latte", "basePrice": 4.50, "availability": "IN_STOCK"},
                    {"productId": 6, "category": "COOKIES", "name": "Snickerdoodle", "basePrice": 2.25, "availability": "OUT_OF_STOCK"}
                ])
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server);
        let first = client.list_menu().await.unwrap();
        let second = client.list_menu().await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_menu_server_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api/menu")
            .with_status(500)
            .with_body("database down")
            .create_async()
            .await;

        let err = client_for(&server).list_menu().await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 500, ref message } if message == "database down"));
    }

    #[tokio::test]
    async fn test_product_description_blank_is_none() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api/menu/description/5")
            .with_status(200)
            .with_body(json!({"description": "  "}).to_string())
            .create_async()
            .await;

        let text = client_for(&server)
            .product_description(ProductId::new(5))
            .await
            .unwrap();
        assert!(text.is_none());
    }

    #[tokio::test]
    async fn test_login_posts_credentials() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/api/auth/login")
            .match_body(Matcher::Json(json!({"email": "a@b.com", "password": "pw"})))
            .with_status(200)
            .with_body(
                json!({"token": "jwt", "email": "a@b.com", "firstName": "Ada", "lastName": "B"})
                    .to_string(),
            )
            .create_async()
            .await;

        let auth = client_for(&server)
            .login("a@b.com", &SecretString::from("pw"))
            .await
            .unwrap();
        assert_eq!(auth.token, "jwt");
        assert_eq!(auth.first_name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/api/auth/login")
            .with_status(404)
            .with_body("User not found")
            .create_async()
            .await;

        let err = client_for(&server)
            .login("nobody@b.com", &SecretString::from("pw"))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "User not found");
    }

    #[tokio::test]
    async fn test_member_order_sends_bearer_and_maps_401() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/api/cart/member/submit")
            .match_header("authorization", "Bearer stale-token")
            .with_status(401)
            .create_async()
            .await;

        let order = MemberOrderRequest {
            items: vec![OrderItemInput {
                product_id: ProductId::new(5),
                quantity: 1,
            }],
        };
        let err = client_for(&server)
            .submit_member_order(&order, &SecretString::from("stale-token"))
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_guest_order_receipt() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/api/cart/guest/submit")
            .match_body(Matcher::PartialJson(json!({"email": "a@b.com"})))
            .with_status(201)
            .with_body(json!({"orderId": 42, "totalCost": 13.50, "status": "PENDING"}).to_string())
            .create_async()
            .await;

        let order = GuestOrderRequest {
            items: vec![OrderItemInput {
                product_id: ProductId::new(5),
                quantity: 3,
            }],
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            email: "a@b.com".to_string(),
        };
        let receipt = client_for(&server).submit_guest_order(&order).await.unwrap();
        assert_eq!(receipt.order_id.as_deref(), Some("42"));
        assert_eq!(receipt.total, Some(javacafe_core::Price::from_cents(1350)));
    }

    #[tokio::test]
    async fn test_contact_accepts_empty_body() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/api/contact/submit")
            .with_status(201)
            .create_async()
            .await;

        let form = ContactRequest {
            firstname: "A".to_string(),
            lastname: "B".to_string(),
            phone: String::new(),
            email: "a@b.com".to_string(),
            subject: "Hours".to_string(),
            message: "Open on Sunday?".to_string(),
        };
        let receipt = client_for(&server).submit_contact(&form).await.unwrap();
        assert!(receipt.submission_id.is_none());
    }

    #[test]
    fn test_user_messages() {
        let err = ApiError::Status {
            status: 500,
            message: String::new(),
        };
        assert_eq!(err.user_message(), "HTTP 500");
        assert_eq!(
            ApiError::Unauthorized(String::new()).user_message(),
            "Session expired. Please login again."
        );
    }
}
