//! Cart commands.

use javacafe_core::ProductId;
use javacafe_storefront::cart::CartStore;
use javacafe_storefront::error::AppError;
use javacafe_storefront::state::Storefront;

/// Print the cart and its total.
pub fn show(store: &Storefront) {
    print_cart(store.cart());
}

pub async fn add(store: &mut Storefront, id: ProductId, quantity: u32) -> Result<(), AppError> {
    store.add_to_cart(id, quantity).await?;
    print_cart(store.cart());
    Ok(())
}

pub fn set(store: &mut Storefront, id: ProductId, quantity: i64) -> Result<(), AppError> {
    report(store.set_quantity(id, quantity)?, id);
    print_cart(store.cart());
    Ok(())
}

pub fn adjust(store: &mut Storefront, id: ProductId, delta: i64) -> Result<(), AppError> {
    report(store.adjust_quantity(id, delta)?, id);
    print_cart(store.cart());
    Ok(())
}

pub fn remove(store: &mut Storefront, id: ProductId) -> Result<(), AppError> {
    report(store.remove_from_cart(id)?, id);
    print_cart(store.cart());
    Ok(())
}

pub fn clear(store: &mut Storefront) -> Result<(), AppError> {
    store.clear_cart()?;
    print_cart(store.cart());
    Ok(())
}

fn report(changed: bool, id: ProductId) {
    if !changed {
        println!("Nothing changed for product {id}.");
    }
}

fn print_cart(cart: &CartStore) {
    if cart.is_empty() {
        println!("Your cart is empty.");
        return;
    }

    for line in cart.lines() {
        println!(
            "{:>4}  {:<28} {:>3} x {:>7} = {:>8}",
            line.product_id,
            line.name,
            line.quantity,
            line.unit_price.to_string(),
            line.line_total().to_string()
        );
    }
    println!("Items: {}  Total: {}", cart.item_count(), cart.total());
}
