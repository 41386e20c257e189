//! Menu presentation helpers.
//!
//! Products are grouped under their category with the cafe's signature
//! categories first and everything else alphabetical after them.

use std::collections::BTreeMap;

use javacafe_core::ProductId;

use crate::api::{ApiError, MenuProduct};

/// Categories shown first, in this order.
pub const PREFERRED_CATEGORY_ORDER: [&str; 4] = ["COFFEE", "CUPCAKES", "CROISSANTS", "COOKIES"];

/// Category used for products the backend left uncategorized.
pub const FALLBACK_CATEGORY: &str = "OTHER";

/// One section of the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuCategory {
    /// Category as sent by the backend, e.g. `COFFEE`.
    pub key: String,
    /// Display name, e.g. `Coffee`.
    pub label: String,
    pub products: Vec<MenuProduct>,
}

/// Group products into menu sections.
///
/// Products keep their backend order within a section.
#[must_use]
pub fn group_by_category(products: Vec<MenuProduct>) -> Vec<MenuCategory> {
    let mut groups: BTreeMap<String, Vec<MenuProduct>> = BTreeMap::new();
    for product in products {
        let key = product
            .category
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(FALLBACK_CATEGORY)
            .to_string();
        groups.entry(key).or_default().push(product);
    }

    let mut sections: Vec<MenuCategory> = groups
        .into_iter()
        .map(|(key, products)| MenuCategory {
            label: format_category_name(Some(&key)),
            key,
            products,
        })
        .collect();

    // BTreeMap already gives alphabetical order; a stable sort keeps it
    // for the non-preferred categories.
    sections.sort_by_key(|section| category_rank(&section.key));
    sections
}

fn category_rank(key: &str) -> usize {
    PREFERRED_CATEGORY_ORDER
        .iter()
        .position(|preferred| *preferred == key)
        .unwrap_or(PREFERRED_CATEGORY_ORDER.len())
}

/// Display form of a category: first letter upper case, the rest lower.
///
/// ```
/// use javacafe_storefront::menu::format_category_name;
///
/// assert_eq!(format_category_name(Some("COFFEE")), "Coffee");
/// assert_eq!(format_category_name(None), "Other");
/// ```
#[must_use]
pub fn format_category_name(category: Option<&str>) -> String {
    let Some(category) = category.filter(|c| !c.is_empty()) else {
        return "Other".to_string();
    };

    let mut chars = category.chars();
    chars.next().map_or_else(String::new, |first| {
        first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect()
    })
}

/// Generated description for products without one.
#[must_use]
pub fn fallback_description(name: &str) -> String {
    format!("Delicious {name} - a perfect choice for any time of day.")
}

/// The fetched description, or the generated one when fetching failed or
/// the backend had no text.
#[must_use]
pub fn description_or_fallback(
    product: &MenuProduct,
    fetched: Result<Option<String>, ApiError>,
) -> String {
    match fetched {
        Ok(Some(text)) if !text.trim().is_empty() => text,
        Ok(_) => fallback_description(&product.name),
        Err(e) => {
            tracing::warn!(product = %product.name, error = %e, "Description unavailable, using fallback");
            fallback_description(&product.name)
        }
    }
}

/// Look up a product by id.
#[must_use]
pub fn find_product(products: &[MenuProduct], id: ProductId) -> Option<&MenuProduct> {
    products.iter().find(|p| p.product_id == Some(id))
}
