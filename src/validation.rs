use serde::Serialize;

use crate::error::AppError;

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub msg: String,
}

/// Collects field errors for a request body and turns them into a single
/// `AppError::Validation` once every rule has been checked.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for `field` unless `ok` holds.
    pub fn check(&mut self, ok: bool, field: &str, msg: &str) -> &mut Self {
        if !ok {
            self.errors.push(FieldError {
                field: field.to_string(),
                msg: msg.to_string(),
            });
        }
        self
    }

    /// The value must be present and contain something other than whitespace.
    pub fn required(&mut self, value: Option<&str>, field: &str, msg: &str) -> &mut Self {
        let ok = value.is_some_and(|v| !v.trim().is_empty());
        self.check(ok, field, msg)
    }

    pub fn min_chars(
        &mut self,
        value: Option<&str>,
        min: usize,
        field: &str,
        msg: &str,
    ) -> &mut Self {
        let ok = value.is_some_and(|v| v.trim().chars().count() >= min);
        self.check(ok, field, msg)
    }

    pub fn email(&mut self, value: Option<&str>, field: &str, msg: &str) -> &mut Self {
        let ok = value.is_some_and(is_valid_email);
        self.check(ok, field, msg)
    }

    pub fn finish(&mut self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}

/// Structural email check: one `@`, a non-empty local part and a dotted
/// domain whose labels are non-empty. No whitespace anywhere.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || !domain.contains('.') {
        return false;
    }
    domain.split('.').all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_alphanumeric() || c == '-')
    })
}

/// Treat blank strings from form submissions as absent values.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
