//! Contact form command.

use javacafe_storefront::contact::ContactForm;
use javacafe_storefront::error::AppError;
use javacafe_storefront::state::Storefront;

pub async fn submit(store: &Storefront, form: &ContactForm) -> Result<(), AppError> {
    let receipt = store.submit_contact(form).await?;
    println!("Thank you for your inquiry! We'll get back to you soon.");
    if let Some(id) = receipt.submission_id {
        println!("Reference: {id}");
    }
    Ok(())
}
