//! Wire types for the cafe backend.
//!
//! Field names follow the backend's camelCase JSON. Request types borrow
//! their data so secrets are only exposed for the duration of serialization.

use javacafe_core::{Availability, Price, ProductId, SubmissionId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ApiError;

// =============================================================================
// Menu
// =============================================================================

/// A product as listed by `GET /api/menu`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuProduct {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub category: Option<String>,
    pub name: String,
    pub base_price: Price,
    #[serde(default)]
    pub availability: Option<Availability>,
}

impl MenuProduct {
    /// Whether the product may be added to the cart.
    #[must_use]
    pub fn is_orderable(&self) -> bool {
        self.availability
            .as_ref()
            .is_some_and(Availability::is_orderable)
    }
}

/// Response of `GET /api/menu/description/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductDescription {
    #[serde(default)]
    pub description: Option<String>,
}

// =============================================================================
// Auth
// =============================================================================

/// Body of `POST /api/auth/login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of `POST /api/auth/register`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
}

/// Response of the login and register endpoints.
///
/// Older backends return only the token, so the profile fields are optional.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl std::fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthResponse")
            .field("token", &"[REDACTED]")
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish()
    }
}

// =============================================================================
// Orders
// =============================================================================

/// One `{productId, quantity}` entry of an order submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body of `POST /api/cart/guest/submit`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestOrderRequest {
    pub items: Vec<OrderItemInput>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Body of the member order endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct MemberOrderRequest {
    pub items: Vec<OrderItemInput>,
}

/// What the backend tells us about a created order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReceipt {
    /// Order number, if the response carried one.
    pub order_id: Option<String>,
    /// Server-computed total, if the response carried one.
    pub total: Option<Price>,
    /// Order status as reported by the backend.
    pub status: Option<String>,
}

impl OrderReceipt {
    /// Interpret an order submission response body.
    ///
    /// The id is read from `id`, `orderId` or `orderid` (in that order) and
    /// the total from `total` or `totalCost`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Parse`] if the body is not a JSON object or the
    /// total is not a valid price.
    pub fn from_value(value: Value) -> Result<Self, ApiError> {
        let Value::Object(map) = value else {
            return Err(ApiError::Parse(
                "order response is not a JSON object".to_string(),
            ));
        };

        let order_id = ["id", "orderId", "orderid"]
            .iter()
            .find_map(|key| scalar_to_string(map.get(*key)));

        let total = match ["total", "totalCost"].iter().find_map(|key| non_null(&map, key)) {
            Some(raw) => Some(
                serde_json::from_value::<Price>(raw.clone())
                    .map_err(|e| ApiError::Parse(format!("invalid order total: {e}")))?,
            ),
            None => None,
        };

        let status = map.get("status").and_then(Value::as_str).map(String::from);

        Ok(Self {
            order_id,
            total,
            status,
        })
    }
}

fn non_null<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|v| !v.is_null())
}

fn scalar_to_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// =============================================================================
// Contact
// =============================================================================

/// Body of `POST /api/contact/submit`.
///
/// The backend record uses all-lowercase `firstname`/`lastname`.
#[derive(Debug, Clone, Serialize)]
pub struct ContactRequest {
    pub firstname: String,
    pub lastname: String,
    pub phone: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// Response of `POST /api/contact/submit`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactReceipt {
    #[serde(default)]
    pub submission_id: Option<SubmissionId>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_menu_product_from_backend_json() {
        let product: MenuProduct = serde_json::from_value(json!({
            "productId": 5,
            "category": "COFFEE",
            "name": "Latte",
            "basePrice": 4.50,
            "availability": "IN_STOCK"
        }))
        .unwrap();

        assert_eq!(product.product_id, Some(ProductId::new(5)));
        assert_eq!(product.base_price, Price::from_cents(450));
        assert!(product.is_orderable());
    }

    #[test]
    fn test_menu_product_missing_optional_fields() {
        let product: MenuProduct =
            serde_json::from_value(json!({"name": "Mystery", "basePrice": "1.00"})).unwrap();
        assert!(product.product_id.is_none());
        assert!(product.category.is_none());
        assert!(!product.is_orderable());
    }

    #[test]
    fn test_guest_order_request_wire_names() {
        let body = GuestOrderRequest {
            items: vec![OrderItemInput {
                product_id: ProductId::new(5),
                quantity: 3,
            }],
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            email: "a@b.com".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "items": [{"productId": 5, "quantity": 3}],
                "firstName": "A",
                "lastName": "B",
                "email": "a@b.com"
            })
        );
    }

    #[test]
    fn test_order_receipt_id_fallbacks() {
        let receipt = OrderReceipt::from_value(json!({"orderId": "42", "total": 13.50})).unwrap();
        assert_eq!(receipt.order_id.as_deref(), Some("42"));
        assert_eq!(receipt.total, Some(Price::from_cents(1350)));

        let receipt = OrderReceipt::from_value(json!({"orderid": 7})).unwrap();
        assert_eq!(receipt.order_id.as_deref(), Some("7"));
        assert!(receipt.total.is_none());

        let receipt = OrderReceipt::from_value(json!({"id": 9, "totalCost": "8.25", "status": "PENDING"}))
            .unwrap();
        assert_eq!(receipt.order_id.as_deref(), Some("9"));
        assert_eq!(receipt.total, Some(Price::from_cents(825)));
        assert_eq!(receipt.status.as_deref(), Some("PENDING"));
    }

    #[test]
    fn test_order_receipt_prefers_id() {
        let receipt = OrderReceipt::from_value(json!({"id": 101, "orderId": "A-17"})).unwrap();
        assert_eq!(receipt.order_id.as_deref(), Some("101"));
    }

    #[test]
    fn test_order_receipt_rejects_non_object() {
        assert!(matches!(
            OrderReceipt::from_value(json!([1, 2])),
            Err(ApiError::Parse(_))
        ));
        assert!(OrderReceipt::from_value(json!({"total": "lots"})).is_err());
    }

    #[test]
    fn test_auth_response_debug_redacts_token() {
        let response: AuthResponse =
            serde_json::from_value(json!({"token": "jwt-secret-value", "firstName": "Ada"})).unwrap();
        let debug = format!("{response:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("jwt-secret-value"));
    }
}
