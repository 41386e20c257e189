//! Sign-in commands.

use javacafe_storefront::error::AppError;
use javacafe_storefront::state::Storefront;
use secrecy::SecretString;

pub async fn login(store: &mut Storefront, email: &str, password: String) -> Result<(), AppError> {
    let profile = store.login(email, SecretString::from(password)).await?;
    println!("Welcome back, {}!", profile.display_name());
    Ok(())
}

pub async fn register(
    store: &mut Storefront,
    email: &str,
    password: String,
    first_name: &str,
    last_name: &str,
) -> Result<(), AppError> {
    let profile = store
        .register(email, SecretString::from(password), first_name, last_name)
        .await?;
    println!("Welcome, {}! Your account is ready.", profile.display_name());
    Ok(())
}

pub fn logout(store: &mut Storefront) -> Result<(), AppError> {
    store.logout()?;
    println!("Signed out.");
    Ok(())
}

pub fn whoami(store: &Storefront) {
    match store.session().profile() {
        Some(profile) => println!("Signed in as {}", profile.email),
        None => println!("Not signed in."),
    }
}
