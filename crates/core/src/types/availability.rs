//! Menu product availability.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Stock status of a menu product.
///
/// The backend sends `"IN_STOCK"` or `"OUT_OF_STOCK"`; anything else is kept
/// verbatim as [`Availability::Unknown`] rather than failing the whole menu.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Availability {
    InStock,
    OutOfStock,
    Unknown(String),
}

impl Availability {
    /// Only in-stock products can be added to the cart.
    #[must_use]
    pub const fn is_orderable(&self) -> bool {
        matches!(self, Self::InStock)
    }

    /// Label shown next to a product.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::InStock => "In Stock",
            Self::OutOfStock | Self::Unknown(_) => "Out of Stock",
        }
    }
}

impl From<String> for Availability {
    fn from(value: String) -> Self {
        match value.as_str() {
            "IN_STOCK" => Self::InStock,
            "OUT_OF_STOCK" => Self::OutOfStock,
            _ => Self::Unknown(value),
        }
    }
}

impl From<Availability> for String {
    fn from(value: Availability) -> Self {
        match value {
            Availability::InStock => "IN_STOCK".to_string(),
            Availability::OutOfStock => "OUT_OF_STOCK".to_string(),
            Availability::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_values() {
        let in_stock: Availability = serde_json::from_str("\"IN_STOCK\"").unwrap();
        let sold_out: Availability = serde_json::from_str("\"OUT_OF_STOCK\"").unwrap();
        let odd: Availability = serde_json::from_str("\"SEASONAL\"").unwrap();

        assert!(in_stock.is_orderable());
        assert!(!sold_out.is_orderable());
        assert_eq!(odd, Availability::Unknown("SEASONAL".to_string()));
        assert_eq!(serde_json::to_string(&odd).unwrap(), "\"SEASONAL\"");
    }

    #[test]
    fn test_labels() {
        assert_eq!(Availability::InStock.to_string(), "In Stock");
        assert_eq!(Availability::OutOfStock.to_string(), "Out of Stock");
    }
}
