//! Java Cafe Core - Shared types library.
//!
//! This crate provides common types used across all Java Cafe components:
//! - `storefront` - Cart, checkout and session logic plus the backend API client
//! - `cli` - The `javacafe` command-line front end
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no HTTP
//! clients, no persistence. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, names and availability

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
