//! Cache types for menu responses.

use javacafe_core::ProductId;

use super::types::MenuProduct;

/// Cache key for menu data.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Menu,
    Description(ProductId),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Menu(Vec<MenuProduct>),
    Description(Option<String>),
}
