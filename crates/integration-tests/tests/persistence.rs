//! Cart and sign-in persistence across storefront instances.

#![allow(clippy::unwrap_used)]

use std::fs;

use javacafe_core::ProductId;
use javacafe_integration_tests::{TestContext, auth_body};
use javacafe_storefront::cart::repository::CART_FILE;
use javacafe_storefront::session::SESSION_FILE;
use secrecy::{ExposeSecret, SecretString};

#[tokio::test]
async fn test_cart_survives_restart() {
    let ctx = TestContext::new().await;
    let dir = tempfile::tempdir().unwrap();

    let mut first = ctx.file_storefront(dir.path());
    first.add_to_cart(ProductId::new(5), 2).await.unwrap();
    first.add_to_cart(ProductId::new(6), 1).await.unwrap();
    drop(first);

    let reopened = ctx.file_storefront(dir.path());
    assert_eq!(reopened.cart().lines().len(), 2);
    assert_eq!(reopened.cart().total().to_string(), "$12.25");
    assert!(dir.path().join(CART_FILE).exists());
}

#[tokio::test]
async fn test_other_instance_changes_are_picked_up() {
    let ctx = TestContext::new().await;
    let dir = tempfile::tempdir().unwrap();

    let mut tab_a = ctx.file_storefront(dir.path());
    let mut tab_b = ctx.file_storefront(dir.path());

    tab_a.add_to_cart(ProductId::new(5), 1).await.unwrap();
    assert!(tab_b.cart().is_empty());

    assert!(tab_b.sync_cart().unwrap());
    assert_eq!(tab_b.cart().item_count(), 1);

    // Last write wins
    tab_b.adjust_quantity(ProductId::new(5), 2).unwrap();
    assert!(tab_a.sync_cart().unwrap());
    assert_eq!(tab_a.cart().item_count(), 3);
    assert!(!tab_a.sync_cart().unwrap());
}

#[tokio::test]
async fn test_shared_store_notifies_other_instances() {
    let ctx = TestContext::new().await;
    let mut tab_a = ctx.storefront();
    let tab_b = ctx.storefront();
    let mut changes = tab_b.cart().subscribe();

    tab_a.add_to_cart(ProductId::new(7), 3).await.unwrap();

    let change = changes.recv().await.unwrap();
    assert_eq!(change.item_count, 3);
    assert_eq!(change.writer, tab_a.cart().writer());
}

#[tokio::test]
async fn test_corrupt_cart_file_starts_empty() {
    let ctx = TestContext::new().await;
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(CART_FILE), "[[[ definitely not a cart").unwrap();

    let mut store = ctx.file_storefront(dir.path());
    assert!(store.cart().is_empty());

    // The next save replaces the bad file
    store.add_to_cart(ProductId::new(5), 1).await.unwrap();
    assert_eq!(ctx.file_storefront(dir.path()).cart().item_count(), 1);
}

#[tokio::test]
async fn test_sign_in_survives_restart_until_logout() {
    let mut ctx = TestContext::new().await;
    ctx.server
        .mock("POST", "/api/auth/login")
        .with_status(200)
        .with_body(auth_body("jwt-token", "ada@example.com"))
        .create_async()
        .await;
    let dir = tempfile::tempdir().unwrap();

    let mut first = ctx.file_storefront(dir.path());
    first
        .login("ada@example.com", SecretString::from("pw"))
        .await
        .unwrap();
    drop(first);

    let mut reopened = ctx.file_storefront(dir.path());
    assert_eq!(
        reopened.session().token().unwrap().expose_secret(),
        "jwt-token"
    );
    assert_eq!(
        reopened.session().profile().unwrap().first_name.as_deref(),
        Some("Ada")
    );

    reopened.logout().unwrap();
    assert!(!dir.path().join(SESSION_FILE).exists());
    assert!(!ctx.file_storefront(dir.path()).session().is_authenticated());
}
