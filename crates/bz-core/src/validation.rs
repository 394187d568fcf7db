//! Local checks that run before a request is sent. A failure carries the
//! offending field so the view can mark it.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ClientError;

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

pub fn is_email(value: &str) -> bool {
    EMAIL.is_match(value)
}

/// Returns the trimmed value, or a validation error when it is blank.
pub fn required<'a>(field: &str, value: &'a str, message: &str) -> Result<&'a str, ClientError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ClientError::invalid(field, message));
    }
    Ok(trimmed)
}

pub fn email<'a>(field: &str, value: &'a str, message: &str) -> Result<&'a str, ClientError> {
    let trimmed = value.trim();
    if !is_email(trimmed) {
        return Err(ClientError::invalid(field, message));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(is_email("a@b.co"));
        assert!(!is_email("a@b"));
        assert!(!is_email("a b@c.d"));
        assert!(!is_email(""));
    }

    #[test]
    fn required_trims_and_names_the_field() {
        assert_eq!(required("title", "  Bike ", "Required").unwrap(), "Bike");
        match required("title", "   ", "Required") {
            Err(ClientError::Validation { field, message, status }) => {
                assert_eq!(field.as_deref(), Some("title"));
                assert_eq!(message, "Required");
                assert!(status.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
