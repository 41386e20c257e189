//! Subcommand implementations.
//!
//! Each command drives the [`Storefront`](javacafe_storefront::state::Storefront)
//! and prints its result to stdout.

pub mod account;
pub mod cart;
pub mod checkout;
pub mod contact;
pub mod menu;
