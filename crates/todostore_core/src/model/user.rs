//! User record stored at `/users/{email}`.

use super::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$")
        .expect("valid email regex")
});

/// Account known to the store, keyed by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
}

impl User {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }

    /// Checks that `email` is present and looks like an address.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_email(&self.email)
    }
}

/// Returns `Ok` when `value` is a syntactically valid email address.
pub fn validate_email(value: &str) -> Result<(), ValidationError> {
    if EMAIL_PATTERN.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{validate_email, User};
    use crate::model::ValidationError;

    #[test]
    fn accepts_plain_addresses() {
        assert!(User::new("alice@example.com").validate().is_ok());
        assert!(validate_email("first.last+tag@sub.example.org").is_ok());
    }

    #[test]
    fn rejects_values_that_cannot_be_partition_names() {
        for value in ["", "all", "alice", "a/b@example.com", "alice@", "@example.com"] {
            assert_eq!(
                validate_email(value),
                Err(ValidationError::InvalidEmail(value.to_string())),
                "`{value}` should be rejected"
            );
        }
    }
}
