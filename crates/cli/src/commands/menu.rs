//! Menu browsing commands.

use javacafe_core::ProductId;
use javacafe_storefront::api::MenuProduct;
use javacafe_storefront::error::AppError;
use javacafe_storefront::state::Storefront;

/// Print the menu, optionally a single category.
pub async fn list(store: &Storefront, category: Option<&str>) -> Result<(), AppError> {
    let sections = store.menu().await?;

    let mut shown = 0;
    for section in sections
        .iter()
        .filter(|s| category.is_none_or(|c| s.key.eq_ignore_ascii_case(c)))
    {
        println!("{}", section.label);
        for product in &section.products {
            println!("  {}", product_line(product));
        }
        println!();
        shown += 1;
    }

    if shown == 0 {
        println!("No products found.");
    }
    Ok(())
}

/// Print one product with its description.
pub async fn show(store: &Storefront, id: ProductId) -> Result<(), AppError> {
    let details = store.product(id).await?;
    let product = &details.product;

    println!("{}", product.name);
    println!("Price: {}", product.base_price);
    println!("{}", availability_label(product));
    println!();
    println!("{}", details.description);
    Ok(())
}

fn product_line(product: &MenuProduct) -> String {
    let id = product
        .product_id
        .map_or_else(|| "-".to_string(), |id| id.to_string());
    format!(
        "{id:>4}  {:<28} {:>8}  {}",
        product.name,
        product.base_price.to_string(),
        availability_label(product)
    )
}

fn availability_label(product: &MenuProduct) -> &'static str {
    product
        .availability
        .as_ref()
        .map_or("Unavailable", |a| a.label())
}
