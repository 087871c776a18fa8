// Form validation for the traveler (checkout) and contact forms.
// Validation happens before anything is sent; a failure is reported to the user and
// nothing is submitted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },

    #[error("Please enter a valid email address: {0}")]
    InvalidEmail(String),

    #[error("{0} is required")]
    Blank(&'static str),

    #[error("Invalid date for {field}: {value}")]
    InvalidDate { field: &'static str, value: String },

    #[error("Unknown payment method: {0}")]
    UnknownPaymentMethod(String),

    #[error("Rating must be between 1 and 5, got {0}")]
    RatingOutOfRange(u8),

    #[error("Number of travelers must be between 1 and {max}, got {count}")]
    TravelerCount { count: u32, max: u32 },

    #[error("Invalid price: {0:?}")]
    InvalidPrice(String),

    #[error("No location provided")]
    MissingLocation,

    #[error("{0}")]
    Invalid(String),
}

/// Runs the derived field rules and reports the first failing field, in `fields` order.
///
/// `fields` pairs each struct field with the label used in messages.
pub fn check_fields<T: Validate>(
    value: &T,
    fields: &[(&'static str, &'static str)],
    email: &str,
) -> Result<(), ValidationError> {
    let errors = match value.validate() {
        Ok(()) => return Ok(()),
        Err(errors) => errors,
    };
    Err(first_failure(&errors, fields, email))
}

fn first_failure(
    errors: &ValidationErrors,
    fields: &[(&'static str, &'static str)],
    email: &str,
) -> ValidationError {
    let field_errors = errors.field_errors();
    for &(key, label) in fields {
        let failure = match field_errors.get(key).and_then(|list| list.first()) {
            Some(failure) => failure,
            None => continue,
        };
        if &*failure.code == "email" {
            return ValidationError::InvalidEmail(email.to_string());
        }
        let min = failure
            .params
            .get("min")
            .and_then(|min| min.as_u64())
            .unwrap_or(1) as usize;
        return if min <= 1 {
            ValidationError::Blank(label)
        } else {
            ValidationError::TooShort { field: label, min }
        };
    }
    ValidationError::Invalid(errors.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Card,
    Upi,
    #[serde(rename = "netbanking")]
    NetBanking,
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "card" => Ok(PaymentMethod::Card),
            "upi" => Ok(PaymentMethod::Upi),
            "netbanking" => Ok(PaymentMethod::NetBanking),
            other => Err(ValidationError::UnknownPaymentMethod(other.to_string())),
        }
    }
}

const TRAVELER_FIELDS: [(&str, &str); 4] = [
    ("first_name", "first name"),
    ("last_name", "last name"),
    ("email", "email"),
    ("phone", "phone"),
];

/// Raw traveler form input as typed by the user.
#[derive(Debug, Clone, Default, Validate)]
pub struct TravelerForm {
    #[validate(length(min = 2))]
    pub first_name: String,
    #[validate(length(min = 2))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 10))]
    pub phone: String,
    pub date_of_birth: String,
    pub gender: String,
    pub special_requests: String,
    pub payment_method: PaymentMethod,
}

/// Validated traveler contact details, shaped as the booking endpoint expects them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelerInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

impl TravelerForm {
    pub fn validate(&self) -> Result<TravelerInfo, ValidationError> {
        let form = TravelerForm {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            ..self.clone()
        };
        check_fields(&form, &TRAVELER_FIELDS, &form.email)?;

        let date_of_birth = optional(&form.date_of_birth)
            .map(|raw| {
                NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
                    ValidationError::InvalidDate {
                        field: "date of birth",
                        value: raw.clone(),
                    }
                })
            })
            .transpose()?;

        Ok(TravelerInfo {
            gender: optional(&form.gender),
            first_name: form.first_name,
            last_name: form.last_name,
            email: form.email,
            phone: form.phone,
            date_of_birth,
        })
    }

    pub fn special_requests(&self) -> Option<String> {
        optional(&self.special_requests)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContactForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub subject: String,
    pub message: String,
}

const CONTACT_FIELDS: [(&str, &str); 6] = [
    ("first_name", "first name"),
    ("last_name", "last name"),
    ("email", "email"),
    ("phone", "phone"),
    ("subject", "subject"),
    ("message", "message"),
];

// Payload for `/contact`; the backend expects snake_case keys
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
pub struct ContactMessage {
    #[validate(length(min = 2))]
    pub first_name: String,
    #[validate(length(min = 2))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 10))]
    pub phone: Option<String>,
    #[validate(length(min = 1))]
    pub subject: String,
    #[validate(length(min = 10))]
    pub message: String,
}

impl ContactForm {
    pub fn validate(&self) -> Result<ContactMessage, ValidationError> {
        let message = ContactMessage {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: optional(&self.phone),
            subject: self.subject.trim().to_string(),
            message: self.message.trim().to_string(),
        };
        check_fields(&message, &CONTACT_FIELDS, &message.email)?;
        Ok(message)
    }
}

pub fn validate_email(raw: &str) -> Result<String, ValidationError> {
    let email = raw.trim();
    if validator::validate_email(email) {
        Ok(email.to_string())
    } else {
        Err(ValidationError::InvalidEmail(email.to_string()))
    }
}

fn optional(raw: &str) -> Option<String> {
    let value = raw.trim();
    (!value.is_empty()).then(|| value.to_string())
}
