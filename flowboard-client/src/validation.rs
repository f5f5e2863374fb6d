//! Validation traits for mutation inputs.
//!
//! Common checks extracted so input types stay declarative. Every check
//! returns the typed `ValidationError` and runs before any network call.

use flowboard_core::ValidationError;

/// Validate that a string value is non-empty.
pub trait ValidateNonEmpty {
    /// # Errors
    /// Returns `ValidationError::missing_field` if the value is empty or
    /// whitespace-only.
    fn validate_non_empty(&self, field_name: &str) -> Result<(), ValidationError>;
}

impl ValidateNonEmpty for str {
    fn validate_non_empty(&self, field_name: &str) -> Result<(), ValidationError> {
        if self.trim().is_empty() {
            return Err(ValidationError::missing_field(field_name));
        }
        Ok(())
    }
}

impl ValidateNonEmpty for String {
    fn validate_non_empty(&self, field_name: &str) -> Result<(), ValidationError> {
        self.as_str().validate_non_empty(field_name)
    }
}

impl<T: ValidateNonEmpty> ValidateNonEmpty for Option<T> {
    fn validate_non_empty(&self, field_name: &str) -> Result<(), ValidationError> {
        match self {
            Some(value) => value.validate_non_empty(field_name),
            None => Err(ValidationError::missing_field(field_name)),
        }
    }
}

/// Validate that a string's character count is within an inclusive range.
pub trait ValidateLength {
    fn validate_length(
        &self,
        field_name: &str,
        min: usize,
        max: usize,
    ) -> Result<(), ValidationError>;
}

impl ValidateLength for str {
    fn validate_length(
        &self,
        field_name: &str,
        min: usize,
        max: usize,
    ) -> Result<(), ValidationError> {
        let len = self.chars().count();
        if len < min || len > max {
            return Err(ValidationError::invalid_value(
                field_name,
                format!("length must be between {min} and {max} characters"),
            ));
        }
        Ok(())
    }
}

impl ValidateLength for String {
    fn validate_length(
        &self,
        field_name: &str,
        min: usize,
        max: usize,
    ) -> Result<(), ValidationError> {
        self.as_str().validate_length(field_name, min, max)
    }
}

/// Minimal structural email check: one `@` with a dotted domain.
pub fn validate_email(field_name: &str, value: &str) -> Result<(), ValidationError> {
    value.validate_non_empty(field_name)?;
    let mut parts = value.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();
    if local.is_empty() || domain.is_empty() || !domain.contains('.') || domain.ends_with('.') {
        return Err(ValidationError::invalid_value(
            field_name,
            "must be a valid email address",
        ));
    }
    Ok(())
}

/// `#rrggbb` hex color.
pub fn validate_hex_color(field_name: &str, value: &str) -> Result<(), ValidationError> {
    let valid = value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(ValidationError::invalid_value(
            field_name,
            "must be a #rrggbb hex color",
        ));
    }
    Ok(())
}

/// Password policy: 8-100 chars with upper, lower, digit and symbol.
pub fn validate_password(field_name: &str, value: &str) -> Result<(), ValidationError> {
    value.validate_length(field_name, 8, 100)?;
    let has_upper = value.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = value.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = value.chars().any(|c| c.is_ascii_digit());
    let has_symbol = value.chars().any(|c| !c.is_ascii_alphanumeric());
    if !(has_upper && has_lower && has_digit && has_symbol) {
        return Err(ValidationError::invalid_value(
            field_name,
            "must contain an uppercase letter, a lowercase letter, a number and a special character",
        ));
    }
    Ok(())
}
