//! Java Cafe Storefront library.
//!
//! Client-side shopping for the Java Cafe REST backend: menu browsing,
//! a persisted cart, guest or member checkout, login/registration and the
//! contact form.
//!
//! # Architecture
//!
//! - [`api`] - `reqwest` client for the backend, with a `moka` cache for the menu
//! - [`cart`] - Cart store with merge-on-add semantics and a pluggable repository
//! - [`checkout`] - Checkout state machine (guest or member)
//! - [`session`] - Bearer token and profile, persisted through a session store
//! - [`menu`] - Category grouping and description fallback
//! - [`contact`] - General inquiry form
//! - [`error`] - [`AppError`](error::AppError) and Sentry helpers
//! - [`state`] - [`Storefront`](state::Storefront), the explicitly passed application object
//!
//! Nothing here is global: the caller builds a [`Storefront`](state::Storefront)
//! at start-up and drops it on exit.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod contact;
pub mod error;
pub mod menu;
pub mod session;
pub mod state;
