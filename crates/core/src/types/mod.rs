//! Core types for Java Cafe.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod availability;
pub mod email;
pub mod id;
pub mod name;
pub mod price;

pub use availability::Availability;
pub use email::{Email, EmailError};
pub use id::*;
pub use name::{NameError, PersonName};
pub use price::{Price, PriceError};
