//! Newtype IDs for type-safe entity references.
//!
//! The backend hands out `Long` identifiers, so every ID wraps an `i64`.
//! Use the `define_id!` macro to create wrappers that cannot be mixed up.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i64` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_i64()`
/// - `From<i64>`, `Into<i64>` and `FromStr` implementations
///
/// # Example
///
/// ```rust
/// # use javacafe_core::define_id;
/// define_id!(TableId);
/// define_id!(ReceiptId);
///
/// let table = TableId::new(1);
/// let receipt: ReceiptId = "7".parse().unwrap();
///
/// assert_eq!(table.as_i64(), 1);
/// assert_eq!(receipt.to_string(), "7");
/// // These are different types, so this won't compile:
/// // let _: TableId = receipt;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Create a new ID from an i64 value.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the underlying i64 value.
            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Backend entity IDs
define_id!(ProductId);
define_id!(SubmissionId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_id_serializes_as_bare_number() {
        let id = ProductId::new(5);
        assert_eq!(serde_json::to_string(&id).unwrap(), "5");

        let parsed: ProductId = serde_json::from_str("5").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_product_id_from_str_trims() {
        let id: ProductId = " 42 ".parse().unwrap();
        assert_eq!(id.as_i64(), 42);
        assert!("latte".parse::<ProductId>().is_err());
    }
}
