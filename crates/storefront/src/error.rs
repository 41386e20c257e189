//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type for the storefront operations. Backend
//! and persistence failures are captured to Sentry; callers show
//! [`AppError::user_message`] to the user.

use thiserror::Error;

use crate::api::ApiError;
use crate::cart::CartStoreError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::contact::ContactError;
use crate::session::SessionError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Cafe backend call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Saving or loading the cart failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartStoreError),

    /// Saving or loading the session failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Checkout step rejected.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Contact form rejected.
    #[error("Contact error: {0}")]
    Contact(#[from] ContactError),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from the user.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Whether this error is worth reporting to Sentry.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        match self {
            Self::Api(e) => !e.is_unauthorized(),
            Self::Cart(_) | Self::Session(_) | Self::Config(_) => true,
            Self::Checkout(e) => e.is_backend() || e.is_persistence(),
            Self::Contact(e) => matches!(e, ContactError::Api(_)),
            Self::NotFound(_) | Self::BadRequest(_) => false,
        }
    }

    /// Capture to Sentry when reportable, logging the event id.
    pub fn report(&self) {
        if self.is_reportable() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Storefront error"
            );
        }
    }

    /// Text suitable for showing to the user.
    ///
    /// Storage and configuration details are not exposed.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(e) => e.user_message(),
            Self::Cart(_) => "Could not save your cart.".to_string(),
            Self::Session(_) => "Could not save your sign-in.".to_string(),
            Self::Checkout(e) => e.user_message(),
            Self::Contact(e) => e.user_message(),
            Self::Config(e) => e.to_string(),
            Self::NotFound(what) => format!("{what} not found"),
            Self::BadRequest(msg) => msg.clone(),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "5")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
