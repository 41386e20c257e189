//! Checkout state machine.
//!
//! ```text
//! Idle ─start─▶ ChoosingMode ─choose_guest─▶ GuestForm ─submit_guest─▶ Submitting
//!                    │                                                  │    │
//!               choose_login                                          ok   err
//!                    ▼                                                  ▼    ▼
//!               LoginForm ─sign in─▶ MemberReady ─place_order─▶   Confirmed  back to form
//! ```
//!
//! A 401 on a member order signs the member out and lands on `LoginForm`.
//! Emptying the cart mid-flow resets to `Idle`, except while an order is in
//! flight: the backend's answer still decides. Signing out returns to
//! `ChoosingMode`, and `start_new_order` leaves `Confirmed`.
//!
//! Submissions are split in two: `submit_guest` / `place_order` validate and
//! enter [`CheckoutState::Submitting`], returning the request body to send;
//! [`CheckoutFlow::complete_order`] applies the backend's answer. While
//! submitting, a second submission is rejected.

mod forms;

use javacafe_core::{EmailError, Price};
use secrecy::SecretString;
use thiserror::Error;

use crate::api::{ApiError, GuestOrderRequest, MemberOrderRequest, OrderItemInput, OrderReceipt};
use crate::cart::{CartStore, CartStoreError};
use crate::session::SessionContext;

pub use forms::{Credentials, GuestDetails};

const SESSION_EXPIRED: &str = "Session expired. Please login again.";

/// Errors from checkout steps.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("required fields missing")]
    MissingFields,

    #[error("invalid email: {0}")]
    InvalidEmail(EmailError),

    #[error("email or password missing")]
    MissingCredentials,

    #[error("not signed in")]
    NotSignedIn,

    #[error("order submission already in progress")]
    SubmissionInProgress,

    #[error("cannot {action} while {state}")]
    InvalidStep {
        action: &'static str,
        state: &'static str,
    },

    #[error("session expired")]
    SessionExpired,

    #[error("order rejected: {0}")]
    Rejected(ApiError),

    #[error("login rejected: {0}")]
    LoginRejected(ApiError),

    /// The order went through but the emptied cart could not be saved.
    #[error("order placed but the cart could not be cleared: {source}")]
    CartNotCleared {
        confirmation: Box<OrderConfirmation>,
        source: CartStoreError,
    },
}

impl CheckoutError {
    /// Whether the error came from the backend rather than local validation.
    #[must_use]
    pub const fn is_backend(&self) -> bool {
        match self {
            Self::Rejected(e) | Self::LoginRejected(e) => !e.is_unauthorized(),
            _ => false,
        }
    }

    /// Whether saving the cart failed.
    #[must_use]
    pub const fn is_persistence(&self) -> bool {
        matches!(self, Self::CartNotCleared { .. })
    }

    /// The confirmed order, when the error came after the backend accepted it.
    #[must_use]
    pub fn placed_order(&self) -> Option<&OrderConfirmation> {
        match self {
            Self::CartNotCleared { confirmation, .. } => Some(&**confirmation),
            _ => None,
        }
    }

    /// Text suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyCart => "Your cart is empty".to_string(),
            Self::MissingFields => "Please fill in all required fields".to_string(),
            Self::InvalidEmail(_) => "Please enter a valid email address".to_string(),
            Self::MissingCredentials => "Please enter both email and password".to_string(),
            Self::NotSignedIn => "Please login first".to_string(),
            Self::SubmissionInProgress => "Your order is already being placed".to_string(),
            Self::InvalidStep { .. } => "That step is not available right now".to_string(),
            Self::SessionExpired => SESSION_EXPIRED.to_string(),
            Self::Rejected(e) => e.user_message(),
            Self::LoginRejected(ApiError::Http(_)) => "Failed to login. Please try again.".to_string(),
            Self::LoginRejected(_) => "Invalid email or password".to_string(),
            Self::CartNotCleared { .. } => {
                "Your order was placed, but your cart could not be emptied. \
                 Please clear it before ordering again."
                    .to_string()
            }
        }
    }
}

/// How the customer is checking out, as shown by the checkout page.
///
/// `None` outside an active checkout, including once an order is confirmed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CheckoutMode {
    #[default]
    None,
    Guest,
    LoginRequired,
    MemberReady,
}

/// Who an order is placed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKind {
    Guest,
    Member,
}

/// What the customer sees after a successful order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderConfirmation {
    /// Order number from the backend, when it sent one.
    pub order_id: Option<String>,
    /// Total captured before the cart was cleared.
    pub total: Price,
    pub kind: OrderKind,
    /// The guest's or member's first name, for the thank-you line.
    pub first_name: Option<String>,
}

impl OrderConfirmation {
    /// `Thank you Ada, your order number is: 42`
    #[must_use]
    pub fn greeting(&self) -> String {
        format!(
            "Thank you {}, your order number is: {}",
            self.first_name.as_deref().unwrap_or("Valued Member"),
            self.order_id.as_deref().unwrap_or("Unknown"),
        )
    }
}

/// What was captured when an order was submitted.
#[derive(Debug, Clone)]
struct PendingOrder {
    total: Price,
    first_name: Option<String>,
}

/// Where the checkout is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutState {
    Idle,
    ChoosingMode,
    GuestForm,
    LoginForm,
    MemberReady,
    /// An order is in flight; `from` decides which step a failure returns to.
    Submitting { from: OrderKind },
    Confirmed(OrderConfirmation),
}

impl CheckoutState {
    /// Short name for messages and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ChoosingMode => "choosing a checkout mode",
            Self::GuestForm => "on the guest form",
            Self::LoginForm => "on the login form",
            Self::MemberReady => "ready to place a member order",
            Self::Submitting { .. } => "submitting",
            Self::Confirmed(_) => "confirmed",
        }
    }

    const fn resting_state(kind: OrderKind) -> Self {
        match kind {
            OrderKind::Guest => Self::GuestForm,
            OrderKind::Member => Self::MemberReady,
        }
    }
}

/// The checkout state machine.
#[derive(Debug)]
pub struct CheckoutFlow {
    state: CheckoutState,
    last_error: Option<String>,
    pending: Option<PendingOrder>,
}

impl Default for CheckoutFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckoutFlow {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: CheckoutState::Idle,
            last_error: None,
            pending: None,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &CheckoutState {
        &self.state
    }

    #[must_use]
    pub const fn mode(&self) -> CheckoutMode {
        match &self.state {
            CheckoutState::GuestForm
            | CheckoutState::Submitting {
                from: OrderKind::Guest,
            } => CheckoutMode::Guest,
            CheckoutState::LoginForm => CheckoutMode::LoginRequired,
            CheckoutState::MemberReady
            | CheckoutState::Submitting {
                from: OrderKind::Member,
            } => CheckoutMode::MemberReady,
            CheckoutState::Idle | CheckoutState::ChoosingMode | CheckoutState::Confirmed(_) => {
                CheckoutMode::None
            }
        }
    }

    /// Latest message to show the user.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    #[must_use]
    pub const fn confirmation(&self) -> Option<&OrderConfirmation> {
        match &self.state {
            CheckoutState::Confirmed(confirmation) => Some(confirmation),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        matches!(self.state, CheckoutState::Submitting { .. })
    }

    /// Total to display: the captured one once confirmed, the cart's otherwise.
    #[must_use]
    pub fn display_total(&self, cart: &CartStore) -> Price {
        self.confirmation()
            .map_or_else(|| cart.total(), |confirmation| confirmation.total)
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Begin checking out.
    ///
    /// Signed-in members go straight to [`CheckoutState::MemberReady`].
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] without changing state if the cart
    /// is empty.
    pub fn start(&mut self, cart: &CartStore, session: &SessionContext) -> Result<(), CheckoutError> {
        self.guard_not_submitting()?;
        if cart.is_empty() {
            return Err(self.fail(CheckoutError::EmptyCart));
        }

        self.last_error = None;
        self.state = if session.is_authenticated() {
            CheckoutState::MemberReady
        } else {
            CheckoutState::ChoosingMode
        };
        tracing::debug!(state = self.state.name(), "Checkout started");
        Ok(())
    }

    /// Check out as a guest.
    ///
    /// # Errors
    ///
    /// Returns error unless a mode is being chosen.
    pub fn choose_guest(&mut self, session: &SessionContext) -> Result<(), CheckoutError> {
        self.choose(session, CheckoutState::GuestForm, "choose guest checkout")
    }

    /// Sign in to check out as a member.
    ///
    /// # Errors
    ///
    /// Returns error unless a mode is being chosen.
    pub fn choose_login(&mut self, session: &SessionContext) -> Result<(), CheckoutError> {
        self.choose(session, CheckoutState::LoginForm, "choose member checkout")
    }

    fn choose(
        &mut self,
        session: &SessionContext,
        next: CheckoutState,
        action: &'static str,
    ) -> Result<(), CheckoutError> {
        match self.state {
            CheckoutState::ChoosingMode | CheckoutState::GuestForm | CheckoutState::LoginForm => {
                self.last_error = None;
                self.state = if session.is_authenticated() {
                    CheckoutState::MemberReady
                } else {
                    next
                };
                Ok(())
            }
            _ => Err(self.invalid_step(action)),
        }
    }

    /// Validate sign-in input from the login step.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::MissingCredentials`] if either field is blank;
    /// the flow stays on the login form.
    pub fn begin_login(
        &mut self,
        email: &str,
        password: SecretString,
    ) -> Result<Credentials, CheckoutError> {
        if !matches!(self.state, CheckoutState::LoginForm) {
            return Err(self.invalid_step("sign in"));
        }
        Credentials::parse(email, password).map_err(|e| self.fail(e))
    }

    /// Record the backend's answer to a sign-in.
    ///
    /// A successful answer passes through unchanged; call [`Self::on_login`]
    /// once the session is stored.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::LoginRejected`] if the backend refused; the
    /// flow stays where it is.
    pub fn complete_login<T>(&mut self, outcome: Result<T, ApiError>) -> Result<T, CheckoutError> {
        outcome.map_err(|e| {
            tracing::warn!(error = %e, "Sign-in rejected");
            self.fail(CheckoutError::LoginRejected(e))
        })
    }

    /// A member signed in, from the checkout or elsewhere.
    pub fn on_login(&mut self) {
        if matches!(
            self.state,
            CheckoutState::ChoosingMode | CheckoutState::LoginForm | CheckoutState::GuestForm
        ) {
            self.last_error = None;
            self.state = CheckoutState::MemberReady;
        }
    }

    /// Validate the guest form and start submitting.
    ///
    /// # Errors
    ///
    /// Returns a validation error (the flow stays on the guest form), or
    /// [`CheckoutError::EmptyCart`] (the flow resets to idle).
    pub fn submit_guest(
        &mut self,
        cart: &CartStore,
        first_name: &str,
        last_name: &str,
        email: &str,
    ) -> Result<GuestOrderRequest, CheckoutError> {
        self.guard_not_submitting()?;
        if !matches!(self.state, CheckoutState::GuestForm) {
            return Err(self.invalid_step("submit a guest order"));
        }
        self.guard_cart(cart)?;

        let details = GuestDetails::parse(first_name, last_name, email).map_err(|e| self.fail(e))?;

        self.enter_submitting(OrderKind::Guest, cart, Some(details.first_name.as_str().to_string()));
        Ok(GuestOrderRequest {
            items: order_items(cart),
            first_name: details.first_name.into(),
            last_name: details.last_name.into(),
            email: details.email.into(),
        })
    }

    /// Start submitting a member order.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::NotSignedIn`] (the flow moves to the login
    /// form) or [`CheckoutError::EmptyCart`] (the flow resets to idle).
    pub fn place_order(
        &mut self,
        cart: &CartStore,
        session: &SessionContext,
    ) -> Result<MemberOrderRequest, CheckoutError> {
        self.guard_not_submitting()?;
        if !matches!(self.state, CheckoutState::MemberReady | CheckoutState::LoginForm) {
            return Err(self.invalid_step("place a member order"));
        }
        self.guard_cart(cart)?;

        if !session.is_authenticated() {
            self.state = CheckoutState::LoginForm;
            return Err(self.fail(CheckoutError::NotSignedIn));
        }

        let first_name = session.profile().and_then(|p| p.first_name.clone());
        self.enter_submitting(OrderKind::Member, cart, first_name);
        Ok(MemberOrderRequest {
            items: order_items(cart),
        })
    }

    /// Apply the backend's answer to the order in flight.
    ///
    /// On success the confirmation is captured, the flow is confirmed and then
    /// the cart is cleared. The total is the backend's, or the cart total at
    /// submission. On failure the flow returns to the step the order was
    /// placed from and the cart is kept; a rejected member token also signs
    /// the member out and returns to the login form. A failure after the cart
    /// was emptied elsewhere resets to idle.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::SessionExpired`] on a rejected token,
    /// [`CheckoutError::Rejected`] on any other failure, and
    /// [`CheckoutError::CartNotCleared`] if the order went through but the
    /// emptied cart could not be saved (the flow is still confirmed).
    pub fn complete_order(
        &mut self,
        cart: &mut CartStore,
        session: &mut SessionContext,
        outcome: Result<OrderReceipt, ApiError>,
    ) -> Result<OrderConfirmation, CheckoutError> {
        let CheckoutState::Submitting { from } = self.state else {
            return Err(self.invalid_step("complete an order"));
        };
        let pending = self.pending.take().unwrap_or_else(|| PendingOrder {
            total: cart.total(),
            first_name: None,
        });

        match outcome {
            Ok(receipt) => {
                let confirmation = OrderConfirmation {
                    order_id: receipt.order_id,
                    total: receipt.total.unwrap_or(pending.total),
                    kind: from,
                    first_name: pending.first_name,
                };
                self.last_error = None;
                self.state = CheckoutState::Confirmed(confirmation.clone());

                tracing::info!(
                    order_id = confirmation.order_id.as_deref().unwrap_or("-"),
                    total = %confirmation.total,
                    kind = ?from,
                    "Order confirmed"
                );

                if let Err(source) = cart.clear() {
                    tracing::error!(error = %source, "Order placed but the cart could not be cleared");
                    return Err(self.fail(CheckoutError::CartNotCleared {
                        confirmation: Box::new(confirmation),
                        source,
                    }));
                }
                Ok(confirmation)
            }
            Err(e) if from == OrderKind::Member && e.is_unauthorized() => {
                session.invalidate();
                self.state = self.after_failure(cart, CheckoutState::LoginForm);
                Err(self.fail(CheckoutError::SessionExpired))
            }
            Err(e) => {
                tracing::warn!(error = %e, kind = ?from, "Order submission failed");
                self.state = self.after_failure(cart, CheckoutState::resting_state(from));
                Err(self.fail(CheckoutError::Rejected(e)))
            }
        }
    }

    /// React to a cart change; an emptied cart abandons the checkout.
    ///
    /// An order already in flight is left to [`Self::complete_order`].
    pub fn on_cart_changed(&mut self, cart: &CartStore) {
        if cart.is_empty()
            && !matches!(
                self.state,
                CheckoutState::Idle | CheckoutState::Confirmed(_) | CheckoutState::Submitting { .. }
            )
        {
            tracing::debug!(from = self.state.name(), "Cart emptied, leaving checkout");
            self.state = CheckoutState::Idle;
            self.last_error = None;
        }
    }

    /// React to the member signing out.
    pub fn on_logout(&mut self) {
        if matches!(
            self.state,
            CheckoutState::GuestForm | CheckoutState::LoginForm | CheckoutState::MemberReady
        ) {
            self.state = CheckoutState::ChoosingMode;
            self.last_error = None;
        }
    }

    /// Leave the confirmation screen.
    ///
    /// # Errors
    ///
    /// Returns error unless an order was just confirmed.
    pub fn start_new_order(&mut self) -> Result<(), CheckoutError> {
        if !matches!(self.state, CheckoutState::Confirmed(_)) {
            return Err(self.invalid_step("start a new order"));
        }
        self.state = CheckoutState::Idle;
        self.last_error = None;
        Ok(())
    }

    /// Abandon the checkout and go back to the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::SubmissionInProgress`] while submitting.
    pub fn cancel(&mut self) -> Result<(), CheckoutError> {
        self.guard_not_submitting()?;
        self.state = CheckoutState::Idle;
        self.last_error = None;
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn enter_submitting(&mut self, from: OrderKind, cart: &CartStore, first_name: Option<String>) {
        self.last_error = None;
        self.pending = Some(PendingOrder {
            total: cart.total(),
            first_name,
        });
        self.state = CheckoutState::Submitting { from };
    }

    /// Where a failed submission lands: `resting`, or idle if the cart was
    /// emptied while the order was in flight.
    fn after_failure(&self, cart: &CartStore, resting: CheckoutState) -> CheckoutState {
        if cart.is_empty() {
            tracing::debug!(state = self.state.name(), "Cart emptied during submission");
            CheckoutState::Idle
        } else {
            resting
        }
    }

    fn guard_not_submitting(&mut self) -> Result<(), CheckoutError> {
        if self.is_submitting() {
            return Err(self.fail(CheckoutError::SubmissionInProgress));
        }
        Ok(())
    }

    fn guard_cart(&mut self, cart: &CartStore) -> Result<(), CheckoutError> {
        if cart.is_empty() {
            self.state = CheckoutState::Idle;
            return Err(self.fail(CheckoutError::EmptyCart));
        }
        Ok(())
    }

    fn invalid_step(&mut self, action: &'static str) -> CheckoutError {
        self.fail(CheckoutError::InvalidStep {
            action,
            state: self.state.name(),
        })
    }

    /// Record the error's message for display and hand the error back.
    fn fail(&mut self, error: CheckoutError) -> CheckoutError {
        self.last_error = Some(error.user_message());
        error
    }
}

/// `{productId, quantity}` for every cart line. Prices are left to the backend.
fn order_items(cart: &CartStore) -> Vec<OrderItemInput> {
    cart.lines()
        .iter()
        .map(|line| OrderItemInput {
            product_id: line.product_id,
            quantity: line.quantity,
        })
        .collect()
}
