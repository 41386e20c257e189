//! Application state and the storefront facade.

use std::sync::Arc;

use javacafe_core::{PersonName, ProductId};
use secrecy::SecretString;

use crate::api::{ApiError, CafeClient, ContactReceipt, MenuProduct, OrderReceipt};
use crate::cart::{CartRepository, CartStore, JsonFileCartRepository};
use crate::checkout::{CheckoutError, CheckoutFlow, CheckoutState, Credentials, OrderConfirmation};
use crate::config::StorefrontConfig;
use crate::contact::ContactForm;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::menu::{self, MenuCategory};
use crate::session::{JsonFileSessionStore, Profile, SessionContext, SessionStore};

/// Shared, read-only application state.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configuration and the backend client.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    client: CafeClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> std::result::Result<Self, ApiError> {
        let client = CafeClient::new(&config)?;
        Ok(Self {
            inner: Arc::new(AppStateInner { config, client }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the cafe API client.
    #[must_use]
    pub fn client(&self) -> &CafeClient {
        &self.inner.client
    }
}

/// A product with its long description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDetails {
    pub product: MenuProduct,
    /// Backend description or the generated fallback.
    pub description: String,
}

/// Everything a customer can do: browse, fill the cart, sign in, check out
/// and get in touch.
///
/// Cart changes are fed to the checkout flow so an emptied cart abandons the
/// checkout, and signing out returns the checkout to the mode choice.
pub struct Storefront {
    state: AppState,
    cart: CartStore,
    session: SessionContext,
    checkout: CheckoutFlow,
}

impl Storefront {
    /// Open the storefront with the cart and session stored in the
    /// configured data directory.
    ///
    /// # Errors
    ///
    /// Returns error if the stored cart or session cannot be read.
    pub fn open(state: AppState) -> Result<Self> {
        let data_dir = state.config().data_dir.clone();
        let cart = Arc::new(JsonFileCartRepository::new(&data_dir));
        let session = Arc::new(JsonFileSessionStore::new(&data_dir));
        Self::with_stores(state, cart, session)
    }

    /// Open the storefront on explicit stores.
    ///
    /// # Errors
    ///
    /// Returns error if the stored cart or session cannot be read.
    pub fn with_stores(
        state: AppState,
        cart: Arc<dyn CartRepository>,
        session: Arc<dyn SessionStore>,
    ) -> Result<Self> {
        Ok(Self {
            state,
            cart: CartStore::open(cart)?,
            session: SessionContext::open(session)?,
            checkout: CheckoutFlow::new(),
        })
    }

    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    #[must_use]
    pub const fn session(&self) -> &SessionContext {
        &self.session
    }

    #[must_use]
    pub const fn checkout(&self) -> &CheckoutFlow {
        &self.checkout
    }

    // =========================================================================
    // Menu
    // =========================================================================

    /// The menu grouped into sections.
    ///
    /// # Errors
    ///
    /// Returns error if the menu cannot be fetched.
    pub async fn menu(&self) -> Result<Vec<MenuCategory>> {
        let products = self.state.client().list_menu().await?;
        Ok(menu::group_by_category(products))
    }

    /// A product and its description.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the product is not on the menu, or an
    /// API error if the menu cannot be fetched. A failed description fetch
    /// falls back to the generated text.
    pub async fn product(&self, id: ProductId) -> Result<ProductDetails> {
        let product = self.menu_product(id).await?;
        let fetched = self.state.client().product_description(id).await;
        let description = menu::description_or_fallback(&product, fetched);
        Ok(ProductDetails {
            product,
            description,
        })
    }

    async fn menu_product(&self, id: ProductId) -> Result<MenuProduct> {
        let products = self.state.client().list_menu().await?;
        menu::find_product(&products, id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Product {id}")))
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Add `quantity` of a menu product to the cart.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for an unknown product,
    /// [`AppError::BadRequest`] if it is out of stock, or an error if the
    /// cart cannot be saved.
    pub async fn add_to_cart(&mut self, id: ProductId, quantity: u32) -> Result<bool> {
        let product = self.menu_product(id).await?;
        if !product.is_orderable() {
            return Err(AppError::BadRequest(format!("{} is out of stock", product.name)));
        }

        let changed = self.cart.add_item(&product, quantity);
        self.after_cart_change();
        if changed.as_ref().is_ok_and(|c| *c) {
            let id = id.to_string();
            let qty = quantity.to_string();
            add_breadcrumb(
                "cart",
                "Added to cart",
                Some(&[("product_id", id.as_str()), ("quantity", qty.as_str())]),
            );
        }
        Ok(changed?)
    }

    /// Set the quantity of a cart line; `0` removes it.
    ///
    /// # Errors
    ///
    /// Returns error if the cart cannot be saved.
    pub fn set_quantity(&mut self, id: ProductId, quantity: i64) -> Result<bool> {
        let changed = self.cart.set_quantity(id, quantity);
        self.after_cart_change();
        Ok(changed?)
    }

    /// Step a cart line's quantity up or down.
    ///
    /// # Errors
    ///
    /// Returns error if the cart cannot be saved.
    pub fn adjust_quantity(&mut self, id: ProductId, delta: i64) -> Result<bool> {
        let changed = self.cart.adjust_quantity(id, delta);
        self.after_cart_change();
        Ok(changed?)
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// Returns error if the cart cannot be saved.
    pub fn remove_from_cart(&mut self, id: ProductId) -> Result<bool> {
        let changed = self.cart.remove_item(id);
        self.after_cart_change();
        Ok(changed?)
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns error if the cart cannot be saved.
    pub fn clear_cart(&mut self) -> Result<bool> {
        let changed = self.cart.clear();
        self.after_cart_change();
        Ok(changed?)
    }

    /// Pick up cart changes written by another storefront.
    ///
    /// # Errors
    ///
    /// Returns error if the stored cart cannot be read.
    pub fn sync_cart(&mut self) -> Result<bool> {
        let changed = self.cart.sync()?;
        if changed {
            self.after_cart_change();
        }
        Ok(changed)
    }

    fn after_cart_change(&mut self) {
        self.checkout.on_cart_changed(&self.cart);
    }

    // =========================================================================
    // Account
    // =========================================================================

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank input, a checkout error if the
    /// backend refuses, or a session error if the sign-in cannot be stored.
    pub async fn login(&mut self, email: &str, password: SecretString) -> Result<&Profile> {
        let credentials = self.credentials(email, password)?;
        let outcome = self
            .state
            .client()
            .login(&credentials.email, &credentials.password)
            .await;
        let auth = self.checkout.complete_login(outcome)?;

        let profile = Profile::from_auth(&auth, &credentials.email);
        self.sign_in(SecretString::from(auth.token), profile)
    }

    /// Create an account and sign in with it.
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank input, a checkout error if the
    /// backend refuses, or a session error if the sign-in cannot be stored.
    pub async fn register(
        &mut self,
        email: &str,
        password: SecretString,
        first_name: &str,
        last_name: &str,
    ) -> Result<&Profile> {
        let credentials = self.credentials(email, password)?;
        let (Ok(first_name), Ok(last_name)) = (PersonName::parse(first_name), PersonName::parse(last_name))
        else {
            return Err(CheckoutError::MissingFields.into());
        };

        let outcome = self
            .state
            .client()
            .register(
                &credentials.email,
                &credentials.password,
                first_name.as_str(),
                last_name.as_str(),
            )
            .await;
        let auth = self.checkout.complete_login(outcome)?;

        let mut profile = Profile::from_auth(&auth, &credentials.email);
        profile.first_name.get_or_insert_with(|| first_name.into());
        profile.last_name.get_or_insert_with(|| last_name.into());
        self.sign_in(SecretString::from(auth.token), profile)
    }

    /// Validate credentials through the checkout when it is on its login step.
    fn credentials(&mut self, email: &str, password: SecretString) -> Result<Credentials> {
        let credentials = if matches!(self.checkout.state(), CheckoutState::LoginForm) {
            self.checkout.begin_login(email, password)?
        } else {
            Credentials::parse(email, password)?
        };
        Ok(credentials)
    }

    fn sign_in(&mut self, token: SecretString, profile: Profile) -> Result<&Profile> {
        self.session.login(token, profile)?;
        self.checkout.on_login();
        self.session
            .profile()
            .ok_or_else(|| CheckoutError::NotSignedIn.into())
    }

    /// Sign out.
    ///
    /// # Errors
    ///
    /// Returns error if the stored session cannot be removed; the member is
    /// signed out in memory either way.
    pub fn logout(&mut self) -> Result<()> {
        let result = self.session.logout();
        self.checkout.on_logout();
        Ok(result?)
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Begin checking out the current cart.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] if there is nothing to order.
    pub fn start_checkout(&mut self) -> Result<&CheckoutState> {
        self.checkout.start(&self.cart, &self.session)?;
        Ok(self.checkout.state())
    }

    /// Continue as a guest.
    ///
    /// # Errors
    ///
    /// Returns error unless the checkout is choosing a mode.
    pub fn choose_guest(&mut self) -> Result<&CheckoutState> {
        self.checkout.choose_guest(&self.session)?;
        Ok(self.checkout.state())
    }

    /// Continue by signing in.
    ///
    /// # Errors
    ///
    /// Returns error unless the checkout is choosing a mode.
    pub fn choose_login(&mut self) -> Result<&CheckoutState> {
        self.checkout.choose_login(&self.session)?;
        Ok(self.checkout.state())
    }

    /// Submit the cart as a guest order.
    ///
    /// # Errors
    ///
    /// Returns a validation error (nothing is sent), or the backend's error
    /// with the cart kept and the guest form restored. If the order went
    /// through but the emptied cart could not be saved, returns
    /// [`CheckoutError::CartNotCleared`] carrying the confirmation.
    pub async fn checkout_as_guest(
        &mut self,
        first_name: &str,
        last_name: &str,
        email: &str,
    ) -> Result<OrderConfirmation> {
        let request = self
            .checkout
            .submit_guest(&self.cart, first_name, last_name, email)?;
        add_breadcrumb("checkout", "Submitting guest order", None);

        let outcome = self.state.client().submit_guest_order(&request).await;
        self.finish_order(outcome)
    }

    /// Submit the cart as the signed-in member's order.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::SessionExpired`] if the token was rejected
    /// (the member is signed out, the cart kept), the backend's error, or
    /// [`CheckoutError::CartNotCleared`] as for guest orders.
    pub async fn checkout_as_member(&mut self) -> Result<OrderConfirmation> {
        let request = self.checkout.place_order(&self.cart, &self.session)?;
        add_breadcrumb("checkout", "Submitting member order", None);

        let outcome = match self.session.token() {
            Some(token) => {
                self.state
                    .client()
                    .submit_member_order(&request, token)
                    .await
            }
            None => Err(ApiError::Unauthorized(String::new())),
        };
        self.finish_order(outcome)
    }

    fn finish_order(
        &mut self,
        outcome: std::result::Result<OrderReceipt, ApiError>,
    ) -> Result<OrderConfirmation> {
        let confirmation = self
            .checkout
            .complete_order(&mut self.cart, &mut self.session, outcome);
        self.after_cart_change();
        Ok(confirmation?)
    }

    /// Leave the order confirmation.
    ///
    /// # Errors
    ///
    /// Returns error unless an order was just confirmed.
    pub fn start_new_order(&mut self) -> Result<()> {
        Ok(self.checkout.start_new_order()?)
    }

    /// Abandon the checkout.
    ///
    /// # Errors
    ///
    /// Returns error while an order is being submitted.
    pub fn cancel_checkout(&mut self) -> Result<()> {
        Ok(self.checkout.cancel()?)
    }

    // =========================================================================
    // Contact
    // =========================================================================

    /// Send a general inquiry.
    ///
    /// # Errors
    ///
    /// Returns a validation error (nothing is sent) or the submission error.
    pub async fn submit_contact(&self, form: &ContactForm) -> Result<ContactReceipt> {
        let request = form.validate()?;
        let receipt = self
            .state
            .client()
            .submit_contact(&request)
            .await
            .map_err(crate::contact::ContactError::from)?;

        tracing::info!(subject = %request.subject, "Contact form submitted");
        Ok(receipt)
    }
}
