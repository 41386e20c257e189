//! Checkout form input validation.
//!
//! Nothing here touches the network: a form that fails validation is never
//! submitted.

use javacafe_core::{Email, EmailError, PersonName};
use secrecy::{ExposeSecret, SecretString};

use super::CheckoutError;

/// Validated guest contact details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestDetails {
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub email: Email,
}

impl GuestDetails {
    /// Validate raw guest form input.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::MissingFields`] if any field is blank after
    /// trimming, or [`CheckoutError::InvalidEmail`] if the email does not parse.
    pub fn parse(first_name: &str, last_name: &str, email: &str) -> Result<Self, CheckoutError> {
        let (Ok(first_name), Ok(last_name)) = (PersonName::parse(first_name), PersonName::parse(last_name))
        else {
            return Err(CheckoutError::MissingFields);
        };

        let email = Email::parse(email).map_err(|e| match e {
            EmailError::Empty => CheckoutError::MissingFields,
            other => CheckoutError::InvalidEmail(other),
        })?;

        Ok(Self {
            first_name,
            last_name,
            email,
        })
    }
}

/// Email and password for signing in from the checkout.
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    /// Check that both fields are filled in. The email is trimmed; the
    /// password is kept as typed.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::MissingCredentials`] if either is blank.
    pub fn parse(email: &str, password: SecretString) -> Result<Self, CheckoutError> {
        let email = email.trim();
        if email.is_empty() || password.expose_secret().trim().is_empty() {
            return Err(CheckoutError::MissingCredentials);
        }
        Ok(Self {
            email: email.to_string(),
            password,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_details_trimmed() {
        let details = GuestDetails::parse("  Ada ", "Lovelace", " ada@example.com ").unwrap();
        assert_eq!(details.first_name.as_str(), "Ada");
        assert_eq!(details.email.as_str(), "ada@example.com");
    }

    #[test]
    fn test_guest_details_blank_fields() {
        for (first, last, email) in [
            ("", "B", "a@b.com"),
            ("A", "   ", "a@b.com"),
            ("A", "B", " "),
        ] {
            assert!(matches!(
                GuestDetails::parse(first, last, email),
                Err(CheckoutError::MissingFields)
            ));
        }
    }

    #[test]
    fn test_guest_details_bad_email() {
        assert!(matches!(
            GuestDetails::parse("A", "B", "not-an-email"),
            Err(CheckoutError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_credentials_require_both() {
        assert!(Credentials::parse("a@b.com", SecretString::from("pw")).is_ok());
        assert!(matches!(
            Credentials::parse("  ", SecretString::from("pw")),
            Err(CheckoutError::MissingCredentials)
        ));
        assert!(matches!(
            Credentials::parse("a@b.com", SecretString::from(" ")),
            Err(CheckoutError::MissingCredentials)
        ));
    }
}
