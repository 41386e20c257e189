//! End-to-end checkout tests against a mock backend.

#![allow(clippy::unwrap_used)]

use javacafe_core::{Price, ProductId};
use javacafe_integration_tests::{TestContext, auth_body};
use javacafe_storefront::checkout::{CheckoutError, CheckoutMode, CheckoutState, OrderKind};
use javacafe_storefront::error::AppError;
use mockito::Matcher;
use secrecy::SecretString;
use serde_json::json;

const LATTE: ProductId = ProductId::new(5);
const CROISSANT: ProductId = ProductId::new(6);
const COOKIE: ProductId = ProductId::new(7);

// =============================================================================
// Guest checkout
// =============================================================================

#[tokio::test]
async fn test_guest_order_confirms_and_clears_cart() {
    let mut ctx = TestContext::new().await;
    let order = ctx
        .server
        .mock("POST", "/api/cart/guest/submit")
        .match_body(Matcher::Json(json!({
            "items": [{"productId": 5, "quantity": 3}],
            "firstName": "A",
            "lastName": "B",
            "email": "a@b.com"
        })))
        .with_status(200)
        .with_body(json!({"orderId": 42, "total": 13.50}).to_string())
        .expect(1)
        .create_async()
        .await;

    let mut store = ctx.storefront();
    store.add_to_cart(LATTE, 2).await.unwrap();
    store.add_to_cart(LATTE, 1).await.unwrap();
    assert_eq!(store.cart().lines().len(), 1);
    assert_eq!(store.cart().total().to_string(), "$13.50");

    assert_eq!(store.start_checkout().unwrap(), &CheckoutState::ChoosingMode);
    store.choose_guest().unwrap();
    let confirmation = store.checkout_as_guest(" A ", "B", "a@b.com").await.unwrap();

    assert_eq!(confirmation.order_id.as_deref(), Some("42"));
    assert_eq!(confirmation.total, Price::from_cents(1350));
    assert_eq!(confirmation.kind, OrderKind::Guest);
    assert_eq!(confirmation.greeting(), "Thank you A, your order number is: 42");
    assert_eq!(store.checkout().mode(), CheckoutMode::None);
    assert!(store.cart().is_empty());
    assert_eq!(store.checkout().display_total(store.cart()).to_string(), "$13.50");
    order.assert_async().await;

    // The emptied cart was persisted too
    assert!(ctx.storefront().cart().is_empty());

    store.start_new_order().unwrap();
    assert_eq!(store.checkout().state(), &CheckoutState::Idle);
}

#[tokio::test]
async fn test_guest_validation_never_submits() {
    let mut ctx = TestContext::new().await;
    let order = ctx
        .server
        .mock("POST", "/api/cart/guest/submit")
        .expect(0)
        .create_async()
        .await;

    let mut store = ctx.storefront();
    store.add_to_cart(CROISSANT, 1).await.unwrap();
    store.start_checkout().unwrap();
    store.choose_guest().unwrap();

    let err = store.checkout_as_guest("A", "  ", "a@b.com").await.unwrap_err();
    assert_eq!(err.user_message(), "Please fill in all required fields");
    let err = store.checkout_as_guest("A", "B", "nope").await.unwrap_err();
    assert_eq!(err.user_message(), "Please enter a valid email address");

    assert_eq!(store.checkout().state(), &CheckoutState::GuestForm);
    assert_eq!(store.cart().item_count(), 1);
    order.assert_async().await;
}

#[tokio::test]
async fn test_backend_rejection_keeps_cart_and_form() {
    let mut ctx = TestContext::new().await;
    ctx.server
        .mock("POST", "/api/cart/guest/submit")
        .with_status(400)
        .with_body("Product 6 is no longer available")
        .create_async()
        .await;

    let mut store = ctx.storefront();
    store.add_to_cart(CROISSANT, 2).await.unwrap();
    store.start_checkout().unwrap();
    store.choose_guest().unwrap();

    let err = store.checkout_as_guest("A", "B", "a@b.com").await.unwrap_err();
    assert_eq!(err.user_message(), "Product 6 is no longer available");
    assert_eq!(store.checkout().state(), &CheckoutState::GuestForm);
    assert_eq!(
        store.checkout().last_error(),
        Some("Product 6 is no longer available")
    );
    assert_eq!(store.cart().item_count(), 2);
}

#[tokio::test]
async fn test_empty_cart_cannot_check_out() {
    let ctx = TestContext::new().await;
    let mut store = ctx.storefront();

    let err = store.start_checkout().unwrap_err();
    assert!(matches!(err, AppError::Checkout(CheckoutError::EmptyCart)));
    assert_eq!(err.user_message(), "Your cart is empty");
    assert_eq!(store.checkout().state(), &CheckoutState::Idle);
}

// =============================================================================
// Member checkout
// =============================================================================

#[tokio::test]
async fn test_login_during_checkout_then_member_order() {
    let mut ctx = TestContext::new().await;
    ctx.server
        .mock("POST", "/api/auth/login")
        .match_body(Matcher::Json(json!({"email": "ada@example.com", "password": "pw"})))
        .with_status(200)
        .with_body(auth_body("jwt-token", "ada@example.com"))
        .create_async()
        .await;
    let order = ctx
        .server
        .mock("POST", "/api/cart/member/submit")
        .match_header("authorization", "Bearer jwt-token")
        .match_body(Matcher::Json(json!({"items": [{"productId": 7, "quantity": 4}]})))
        .with_status(201)
        .with_body(json!({"orderid": "A-17", "totalCost": "8.00"}).to_string())
        .expect(1)
        .create_async()
        .await;

    let mut store = ctx.storefront();
    store.add_to_cart(COOKIE, 4).await.unwrap();
    store.start_checkout().unwrap();
    store.choose_login().unwrap();

    let err = store
        .login("ada@example.com", SecretString::from(""))
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "Please enter both email and password");
    assert_eq!(store.checkout().state(), &CheckoutState::LoginForm);

    store
        .login(" ada@example.com ", SecretString::from("pw"))
        .await
        .unwrap();
    assert_eq!(store.checkout().state(), &CheckoutState::MemberReady);

    let confirmation = store.checkout_as_member().await.unwrap();
    assert_eq!(confirmation.order_id.as_deref(), Some("A-17"));
    assert_eq!(confirmation.total, Price::from_cents(800));
    assert_eq!(confirmation.greeting(), "Thank you Ada, your order number is: A-17");
    assert!(store.cart().is_empty());
    order.assert_async().await;
}

#[tokio::test]
async fn test_expired_token_signs_out_and_keeps_cart() {
    let mut ctx = TestContext::new().await;
    ctx.server
        .mock("POST", "/api/auth/login")
        .with_status(200)
        .with_body(auth_body("stale-token", "ada@example.com"))
        .create_async()
        .await;
    ctx.server
        .mock("POST", "/api/cart/member/submit")
        .match_header("authorization", "Bearer stale-token")
        .with_status(401)
        .create_async()
        .await;

    let mut store = ctx.storefront();
    store
        .login("ada@example.com", SecretString::from("pw"))
        .await
        .unwrap();
    for id in [LATTE, CROISSANT, COOKIE] {
        store.add_to_cart(id, 1).await.unwrap();
    }

    assert_eq!(store.start_checkout().unwrap(), &CheckoutState::MemberReady);
    let err = store.checkout_as_member().await.unwrap_err();

    assert!(matches!(err, AppError::Checkout(CheckoutError::SessionExpired)));
    assert_eq!(store.checkout().state(), &CheckoutState::LoginForm);
    assert_eq!(
        store.checkout().last_error(),
        Some("Session expired. Please login again.")
    );
    assert!(store.session().token().is_none());
    assert_eq!(store.cart().lines().len(), 3);

    // The stored sign-in is gone as well
    assert!(!ctx.storefront().session().is_authenticated());
}

#[tokio::test]
async fn test_rejected_login_stays_on_login_form() {
    let mut ctx = TestContext::new().await;
    ctx.server
        .mock("POST", "/api/auth/login")
        .with_status(404)
        .with_body("User not found")
        .create_async()
        .await;

    let mut store = ctx.storefront();
    store.add_to_cart(LATTE, 1).await.unwrap();
    store.start_checkout().unwrap();
    store.choose_login().unwrap();

    let err = store
        .login("nobody@example.com", SecretString::from("pw"))
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "Invalid email or password");
    assert_eq!(store.checkout().state(), &CheckoutState::LoginForm);
    assert_eq!(store.checkout().mode(), CheckoutMode::LoginRequired);
    assert!(!store.session().is_authenticated());
}

#[tokio::test]
async fn test_logout_mid_checkout_returns_to_mode_choice() {
    let mut ctx = TestContext::new().await;
    ctx.server
        .mock("POST", "/api/auth/login")
        .with_status(200)
        .with_body(auth_body("jwt-token", "ada@example.com"))
        .create_async()
        .await;

    let mut store = ctx.storefront();
    store
        .login("ada@example.com", SecretString::from("pw"))
        .await
        .unwrap();
    store.add_to_cart(LATTE, 1).await.unwrap();
    store.start_checkout().unwrap();

    store.logout().unwrap();
    assert_eq!(store.checkout().state(), &CheckoutState::ChoosingMode);
    assert_eq!(store.cart().item_count(), 1);
}

#[tokio::test]
async fn test_register_signs_in() {
    let mut ctx = TestContext::new().await;
    ctx.server
        .mock("POST", "/api/auth/register")
        .match_body(Matcher::Json(json!({
            "email": "new@example.com",
            "password": "pw",
            "firstName": "Grace",
            "lastName": "Hopper"
        })))
        .with_status(201)
        .with_body(json!({"token": "fresh"}).to_string())
        .create_async()
        .await;

    let mut store = ctx.storefront();
    let profile = store
        .register("new@example.com", SecretString::from("pw"), "Grace", "Hopper")
        .await
        .unwrap();
    assert_eq!(profile.email, "new@example.com");
    assert_eq!(profile.display_name(), "Grace");
    assert!(store.session().is_authenticated());
}

// =============================================================================
// Menu and cart rules through the storefront
// =============================================================================

#[tokio::test]
async fn test_out_of_stock_cannot_be_added() {
    let ctx = TestContext::new().await;
    let mut store = ctx.storefront();

    let err = store.add_to_cart(ProductId::new(8), 1).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert!(store.cart().is_empty());
}

#[tokio::test]
async fn test_menu_sections_in_cafe_order() {
    let ctx = TestContext::new().await;
    let store = ctx.storefront();

    let sections = store.menu().await.unwrap();
    let labels: Vec<&str> = sections.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, ["Coffee", "Croissants", "Cookies"]);
    assert_eq!(sections[2].products.len(), 2);
}
