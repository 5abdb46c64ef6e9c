//! Field-level validation for submitted forms.
//!
//! A [`Validator`] is embedded in every form struct. Handlers run each check
//! unconditionally so all problems surface together, then consult
//! [`Validator::valid`] once.

use std::sync::LazyLock;

use regex::Regex;

/// Sanity check for the shape of an email address.
pub static EMAIL_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z]{2,})+$",
    )
    .expect("email pattern is valid")
});

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validator {
    field_errors: Vec<(String, String)>,
    non_field_errors: Vec<String>,
}

impl Validator {
    pub fn valid(&self) -> bool {
        self.field_errors.is_empty() && self.non_field_errors.is_empty()
    }

    /// Records `message` for `field` unless the field already has one.
    pub fn add_field_error(&mut self, field: &str, message: &str) {
        if self.field_error(field).is_none() {
            self.field_errors.push((field.to_string(), message.to_string()));
        }
    }

    pub fn add_non_field_error(&mut self, message: &str) {
        self.non_field_errors.push(message.to_string());
    }

    pub fn check_field(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add_field_error(field, message);
        }
    }

    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.field_errors
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, message)| message.as_str())
    }

    pub fn field_errors(&self) -> &[(String, String)] {
        &self.field_errors
    }

    pub fn non_field_errors(&self) -> &[String] {
        &self.non_field_errors
    }
}

pub fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

pub fn max_chars(value: &str, n: usize) -> bool {
    value.chars().count() <= n
}

pub fn min_chars(value: &str, n: usize) -> bool {
    value.chars().count() >= n
}

pub fn permitted<T: PartialEq>(value: &T, permitted_values: &[T]) -> bool {
    permitted_values.contains(value)
}

pub fn matches(value: &str, rx: &Regex) -> bool {
    rx.is_match(value)
}
