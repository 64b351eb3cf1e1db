//! Contact domain model.
//!
//! # Responsibility
//! - Define the value object callers build for add/update.
//! - Define the stored projection returned by reads.
//!
//! # Invariants
//! - `first_name`, `last_name` and `email` are non-blank.
//! - `phone`, when present, is non-blank.
//! - New emails have a `local@domain.tld` shape. Rows already on disk are
//!   read as stored.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned row identity.
pub type ContactId = i64;

static EMAIL_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

/// Person record passed to and returned from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Business key. Unique across the store.
    pub email: String,
}

/// A contact as persisted, with the identity the store assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredContact {
    pub id: ContactId,
    #[serde(flatten)]
    pub contact: Contact,
}

/// Validation errors for contact invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactValidationError {
    /// A required field is empty, or an optional one is present but blank.
    EmptyField(&'static str),
    InvalidEmail,
}

impl Display for ContactValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "contact field `{field}` must not be empty"),
            Self::InvalidEmail => write!(f, "contact email must look like `name@domain.tld`"),
        }
    }
}

impl Error for ContactValidationError {}

impl Contact {
    /// Creates a contact without a phone number.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            phone: None,
            email: email.into(),
        }
    }

    /// Creates a contact with a phone number.
    pub fn with_phone(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        phone: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            phone: Some(phone.into()),
            ..Self::new(first_name, last_name, email)
        }
    }

    /// Checks every write-time invariant, including the email shape.
    pub fn validate(&self) -> Result<(), ContactValidationError> {
        self.validate_fields()?;
        if !EMAIL_SHAPE.is_match(&self.email) {
            return Err(ContactValidationError::InvalidEmail);
        }
        Ok(())
    }

    /// Checks blank-field rules only.
    ///
    /// Used when the email is carried over unchanged from an existing row,
    /// which may predate the email shape rule.
    pub fn validate_fields(&self) -> Result<(), ContactValidationError> {
        require_text("first_name", &self.first_name)?;
        require_text("last_name", &self.last_name)?;
        if let Some(phone) = &self.phone {
            require_text("phone", phone)?;
        }
        require_text("email", &self.email)?;
        Ok(())
    }
}

fn require_text(field: &'static str, value: &str) -> Result<(), ContactValidationError> {
    if value.trim().is_empty() {
        return Err(ContactValidationError::EmptyField(field));
    }
    Ok(())
}
