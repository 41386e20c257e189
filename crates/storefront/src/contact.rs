//! General inquiry form.

use javacafe_core::{Email, EmailError};
use thiserror::Error;

use crate::api::{ApiError, ContactRequest};

/// Errors from the contact form.
#[derive(Debug, Error)]
pub enum ContactError {
    #[error("required fields missing")]
    MissingFields,

    #[error("invalid email: {0}")]
    InvalidEmail(EmailError),

    #[error("submission failed: {0}")]
    Api(#[from] ApiError),
}

impl ContactError {
    /// Text suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingFields => "Please fill out all required fields (*).".to_string(),
            Self::InvalidEmail(_) => "Please enter a valid email address.".to_string(),
            Self::Api(_) => {
                "There was an error submitting your form. Please try again.".to_string()
            }
        }
    }
}

/// Raw contact form input.
#[derive(Debug, Clone, Default)]
pub struct ContactForm {
    pub first_name: String,
    pub last_name: String,
    /// Optional.
    pub phone: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactForm {
    /// Check the required fields and build the request body.
    ///
    /// All fields are trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError::MissingFields`] if a required field is blank or
    /// [`ContactError::InvalidEmail`] if the email does not parse.
    pub fn validate(&self) -> Result<ContactRequest, ContactError> {
        let required = [
            &self.first_name,
            &self.last_name,
            &self.email,
            &self.subject,
            &self.message,
        ];
        if required.iter().any(|field| field.trim().is_empty()) {
            return Err(ContactError::MissingFields);
        }

        let email = Email::parse(&self.email).map_err(ContactError::InvalidEmail)?;

        Ok(ContactRequest {
            firstname: self.first_name.trim().to_string(),
            lastname: self.last_name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: email.into_inner(),
            subject: self.subject.trim().to_string(),
            message: self.message.trim().to_string(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn filled() -> ContactForm {
        ContactForm {
            first_name: " Ada ".to_string(),
            last_name: "Lovelace".to_string(),
            phone: String::new(),
            email: "ada@example.com".to_string(),
            subject: "Catering".to_string(),
            message: "Do you cater events?".to_string(),
        }
    }

    #[test]
    fn test_phone_is_optional() {
        let request = filled().validate().unwrap();
        assert_eq!(request.firstname, "Ada");
        assert!(request.phone.is_empty());
    }

    #[test]
    fn test_required_fields() {
        let mut form = filled();
        form.subject = "  ".to_string();
        let err = form.validate().unwrap_err();
        assert!(matches!(err, ContactError::MissingFields));
        assert_eq!(err.user_message(), "Please fill out all required fields (*).");

        let mut form = filled();
        form.message.clear();
        assert!(matches!(form.validate(), Err(ContactError::MissingFields)));
    }

    #[test]
    fn test_invalid_email() {
        let mut form = filled();
        form.email = "ada@localhost".to_string();
        assert!(matches!(form.validate(), Err(ContactError::InvalidEmail(_))));
    }

    #[test]
    fn test_wire_field_names() {
        let body = serde_json::to_value(filled().validate().unwrap()).unwrap();
        assert_eq!(body["firstname"], "Ada");
        assert_eq!(body["lastname"], "Lovelace");
        assert_eq!(body["phone"], "");
    }
}
