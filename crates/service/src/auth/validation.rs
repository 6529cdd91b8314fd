//! Request validation: declarative field rules from `validator`, then the
//! rules that need more than one field or a store lookup.
//!
//! All failing fields are reported together, grouped per field.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use validator::{Validate, ValidationErrors};

use super::domain::{Credentials, LoginInput, RegisterInput, ValidRegistration};
use super::errors::AuthError;
use super::repository::UserStore;

pub mod messages {
    pub const EMAIL_TAKEN: &str = "The email has already been taken.";
    pub const PASSWORD_CONFIRMATION: &str = "The password field confirmation does not match.";
}

/// Failing rules keyed by field name, in the shape returned to clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn single(field: &str, message: &str) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: &str) {
        self.0.entry(field.to_string()).or_default().push(message.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// First message, suffixed with how many more were collected.
    pub fn summary(&self) -> String {
        let total: usize = self.0.values().map(Vec::len).sum();
        let first = self
            .0
            .values()
            .flat_map(|m| m.iter())
            .next()
            .cloned()
            .unwrap_or_else(|| "The given data was invalid.".to_string());
        match total {
            0 | 1 => first,
            2 => format!("{first} (and 1 more error)"),
            n => format!("{first} (and {} more errors)", n - 1),
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.fields().collect();
        write!(f, "{}", fields.join(", "))
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FieldErrors::default();
        for (field, errs) in errors.field_errors() {
            let field = field.to_string();
            for e in errs.iter() {
                let msg = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("The {field} field is invalid ({}).", e.code));
                out.add(&field, &msg);
            }
        }
        out
    }
}

fn declarative(input: &impl Validate) -> FieldErrors {
    match input.validate() {
        Ok(()) => FieldErrors::default(),
        Err(e) => e.into(),
    }
}

/// Check registration input: required/length/email rules, password
/// confirmation and email uniqueness. Uniqueness is only looked up when the
/// email is otherwise valid.
pub async fn validate_registration(
    users: &dyn UserStore,
    input: RegisterInput,
) -> Result<ValidRegistration, AuthError> {
    let input = input.normalized();
    let mut errors = declarative(&input);

    if input.password.is_some() && input.password != input.password_confirmation {
        errors.add("password", messages::PASSWORD_CONFIRMATION);
    }

    if let Some(email) = input.email.as_deref() {
        if !errors.has("email") && users.find_by_email(email).await?.is_some() {
            errors.add("email", messages::EMAIL_TAKEN);
        }
    }

    match (input.name, input.email, input.password) {
        (Some(name), Some(email), Some(password)) if errors.is_empty() => {
            Ok(ValidRegistration { name, email, password })
        }
        // an absent field always carries its `required` message
        _ => Err(AuthError::Validation(errors)),
    }
}

/// Check login input shape. Credentials themselves are verified by the service.
pub fn validate_login(input: LoginInput) -> Result<Credentials, AuthError> {
    let input = input.normalized();
    let errors = declarative(&input);
    match (input.email, input.password) {
        (Some(email), Some(password)) if errors.is_empty() => Ok(Credentials { email, password }),
        _ => Err(AuthError::Validation(errors)),
    }
}
