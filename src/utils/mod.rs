// Utility functions

pub mod json_extractor;

use crate::types::*;

/// Validates a value against a constraint and returns an error if it fails
pub fn validate<T, F>(
    value: T,
    constraint: F,
    error_message: impl Into<String>,
) -> ApiResult<T>
where
    F: FnOnce(&T) -> bool,
{
    if constraint(&value) {
        Ok(value)
    } else {
        Err(ApiError::simple_configuration_error(error_message))
    }
}

/// Validates a range constraint for numeric values
pub fn validate_range<T>(
    value: T,
    min: T,
    max: T,
    param_name: &str,
) -> ApiResult<T>
where
    T: PartialOrd + Copy + std::fmt::Display,
{
    validate(
        value,
        |&v| v >= min && v <= max,
        format!("{} must be between {} and {}, but got {}", param_name, min, max, value),
    )
}

/// Validates a string against common constraints
pub struct StringValidator;

impl StringValidator {
    /// Validates that a string is not empty or whitespace
    pub fn not_empty(value: impl Into<String>, param_name: &str) -> ApiResult<String> {
        let value = value.into();
        validate(
            value,
            |s| !s.trim().is_empty(),
            format!("{} cannot be empty", param_name),
        )
    }

    /// Validates that a string has a maximum length in characters
    pub fn max_length(
        value: impl Into<String>,
        max_length: usize,
        param_name: &str,
    ) -> ApiResult<String> {
        let value = value.into();
        validate(
            value,
            |s| s.chars().count() <= max_length,
            format!("{} must be at most {} characters", param_name, max_length),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_validation() {
        assert_eq!(validate_range(5, 1, 20, "count").unwrap(), 5);
        let err = validate_range(0, 1, 20, "count").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationError);
        assert_eq!(err.message(), "count must be between 1 and 20, but got 0");
    }

    #[test]
    fn string_validation() {
        assert!(StringValidator::not_empty("   ", "path").is_err());
        assert_eq!(StringValidator::not_empty("/a", "path").unwrap(), "/a");
        assert!(StringValidator::max_length("abcdef", 3, "title").is_err());
        assert!(StringValidator::max_length("äbc", 3, "title").is_ok());
    }
}
