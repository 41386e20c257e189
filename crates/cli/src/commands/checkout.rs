//! Checkout commands.
//!
//! A command runs the whole checkout in one go: start, pick the mode,
//! submit, and print the confirmation.

use javacafe_storefront::checkout::{CheckoutState, OrderConfirmation};
use javacafe_storefront::error::AppError;
use javacafe_storefront::state::Storefront;
use secrecy::SecretString;

pub async fn guest(
    store: &mut Storefront,
    first_name: &str,
    last_name: &str,
    email: &str,
) -> Result<(), AppError> {
    if store.start_checkout()? != &CheckoutState::ChoosingMode {
        return Err(AppError::BadRequest(
            "You are signed in; use `checkout member` or sign out first".to_string(),
        ));
    }
    store.choose_guest()?;

    print_outcome(store.checkout_as_guest(first_name, last_name, email).await)
}

pub async fn member(
    store: &mut Storefront,
    email: Option<&str>,
    password: Option<String>,
) -> Result<(), AppError> {
    if store.start_checkout()? == &CheckoutState::ChoosingMode {
        store.choose_login()?;
        let (Some(email), Some(password)) = (email, password) else {
            return Err(AppError::BadRequest(
                "Please login first (pass --email and --password)".to_string(),
            ));
        };
        store.login(email, SecretString::from(password)).await?;
    }

    print_outcome(store.checkout_as_member().await)
}

/// Print the confirmation whenever the order went through, even if the cart
/// could not be emptied afterwards.
fn print_outcome(result: Result<OrderConfirmation, AppError>) -> Result<(), AppError> {
    let placed = match &result {
        Ok(confirmation) => Some(confirmation),
        Err(AppError::Checkout(e)) => e.placed_order(),
        Err(_) => None,
    };
    if let Some(confirmation) = placed {
        print_confirmation(confirmation);
    }
    result.map(drop)
}

fn print_confirmation(confirmation: &OrderConfirmation) {
    println!("{}", confirmation.greeting());
    println!("Total: {}", confirmation.total);
}
