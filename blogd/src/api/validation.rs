//! Request body and path validation.
//!
//! Validation is a pure step that runs after the auth guard and before any store access: a raw
//! request model is turned into a typed, normalized value, or into a [`FieldErrors`] map from
//! field name to a human readable message. All failing fields are reported together.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::{
    api::models::{
        auth::{Credentials, LoginRequest, RegisterRequest, Registration},
        posts::{PostInput, PostRequest},
    },
    db::models::posts::PostCategory,
    types::PostId,
};

pub const EMAIL_MAX_LENGTH: usize = 255;
pub const PASSWORD_MIN_LENGTH: usize = 6;
pub const NAME_MAX_LENGTH: usize = 50;
pub const TITLE_MAX_LENGTH: usize = 255;

/// Field name -> message. Serializes as a flat JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.insert(field, message);
        errors
    }

    /// Record a failure. The first message for a field wins.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, message) in other.0 {
            self.insert(field, message);
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Turn a raw request model into its accepted, typed form.
pub trait Validate {
    type Output;

    fn validate(self) -> Result<Self::Output, FieldErrors>;
}

/// Trim and lower-case an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain.split('.').count() >= 2
        && domain.split('.').all(|label| !label.is_empty())
}

fn check_email(email: &str, errors: &mut FieldErrors) {
    if email.is_empty() {
        errors.insert("email", "Email is required");
    } else if email.chars().count() > EMAIL_MAX_LENGTH {
        errors.insert("email", format!("Email should not be more than {EMAIL_MAX_LENGTH} characters"));
    } else if !is_valid_email(email) {
        errors.insert("email", "Email is not a valid email address");
    }
}

fn check_password(password: &str, errors: &mut FieldErrors) {
    if password.chars().count() < PASSWORD_MIN_LENGTH {
        errors.insert("password", format!("Password should be at least {PASSWORD_MIN_LENGTH} characters"));
    }
}

/// Read a body field that must be a string.
///
/// Absent and `null` read as an empty string, so the caller's own checks report them as missing.
/// Any other JSON type records `"{label} must be a string"` under `field` and yields `None`.
fn string_field(value: Option<Value>, field: &str, label: &str, errors: &mut FieldErrors) -> Option<String> {
    match value {
        None | Some(Value::Null) => Some(String::new()),
        Some(Value::String(s)) => Some(s),
        Some(_) => {
            errors.insert(field, format!("{label} must be a string"));
            None
        }
    }
}

impl Validate for LoginRequest {
    type Output = Credentials;

    fn validate(self) -> Result<Credentials, FieldErrors> {
        let mut errors = FieldErrors::default();

        let email = string_field(self.email, "email", "Email", &mut errors).map(|e| normalize_email(&e));
        if let Some(email) = &email {
            check_email(email, &mut errors);
        }
        let password = string_field(self.password, "password", "Password", &mut errors);
        if let Some(password) = &password {
            check_password(password, &mut errors);
        }

        match (email, password) {
            (Some(email), Some(password)) if errors.is_empty() => Ok(Credentials { email, password }),
            _ => Err(errors),
        }
    }
}

impl Validate for RegisterRequest {
    type Output = Registration;

    fn validate(self) -> Result<Registration, FieldErrors> {
        let mut errors = FieldErrors::default();

        let email = string_field(self.email, "email", "Email", &mut errors).map(|e| normalize_email(&e));
        if let Some(email) = &email {
            check_email(email, &mut errors);
        }
        let password = string_field(self.password, "password", "Password", &mut errors);
        if let Some(password) = &password {
            check_password(password, &mut errors);
        }

        let confirm = string_field(self.confirm_password, "confirmPassword", "Password confirmation", &mut errors);
        if matches!((&password, &confirm), (Some(password), Some(confirm)) if confirm != password) {
            errors.insert("confirmPassword", "Passwords do not match");
        }

        let name = string_field(self.name, "name", "Name", &mut errors).map(|n| n.trim().to_string());
        if let Some(name) = &name {
            if name.is_empty() {
                errors.insert("name", "Name is required");
            } else if name.chars().count() > NAME_MAX_LENGTH {
                errors.insert("name", format!("Name should not be more than {NAME_MAX_LENGTH} characters"));
            }
        }

        match (email, password, name) {
            (Some(email), Some(password), Some(name)) if errors.is_empty() => Ok(Registration { email, password, name }),
            _ => Err(errors),
        }
    }
}

impl Validate for PostRequest {
    type Output = PostInput;

    fn validate(self) -> Result<PostInput, FieldErrors> {
        let mut errors = FieldErrors::default();

        let title = string_field(self.title, "title", "Title", &mut errors).map(|t| t.trim().to_string());
        if let Some(title) = &title {
            if title.is_empty() {
                errors.insert("title", "Title is required");
            } else if title.chars().count() > TITLE_MAX_LENGTH {
                errors.insert("title", format!("Title should not be more than {TITLE_MAX_LENGTH} characters"));
            }
        }

        let content = string_field(self.content, "content", "Content", &mut errors);
        if content.as_deref().is_some_and(|c| c.trim().is_empty()) {
            errors.insert("content", "Content is required");
        }

        // Any value outside the enum, whatever its JSON type, gets the same message
        let category = self
            .category
            .as_ref()
            .and_then(Value::as_str)
            .and_then(|c| c.parse::<PostCategory>().ok());
        if category.is_none() {
            errors.insert("category", format!("Category must be one of {}", PostCategory::ALL_NAMES.join(", ")));
        }

        match (title, content, category) {
            (Some(title), Some(content), Some(category)) if errors.is_empty() => Ok(PostInput {
                title,
                content,
                category,
            }),
            _ => Err(errors),
        }
    }
}

/// Parse a path identifier.
pub fn parse_id(raw: &str) -> Result<PostId, FieldErrors> {
    raw.parse::<PostId>()
        .map_err(|_| FieldErrors::single("id", "The 'id' field must be a valid UUID"))
}
