//! Input validation helpers
//!
//! SQLite TEXT has no length enforcement, so limits live here.

use shared::error::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Customer and staff names
pub const MAX_NAME_LEN: usize = 200;

/// Booking notes
pub const MAX_NOTE_LEN: usize = 500;

/// Short identifiers: phone, table number, username
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Passwords (before hashing)
pub const MAX_PASSWORD_LEN: usize = 128;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty"))
            .with_detail("field", field));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Validate that a count is at least `min`.
pub fn validate_min(value: i32, field: &str, min: i32) -> Result<(), AppError> {
    if value < min {
        return Err(
            AppError::validation(format!("{field} must be at least {min}"))
                .with_detail("field", field),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCode;

    #[test]
    fn blank_required_text_is_rejected() {
        let err = validate_required_text("   ", "customer_name", MAX_NAME_LEN).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.message, "customer_name must not be empty");
    }

    #[test]
    fn long_text_is_rejected() {
        let phone = "9".repeat(MAX_SHORT_TEXT_LEN + 1);
        assert!(validate_required_text(&phone, "phone", MAX_SHORT_TEXT_LEN).is_err());
        assert!(validate_optional_text(&Some(phone), "phone", MAX_SHORT_TEXT_LEN).is_err());
        assert!(validate_optional_text(&None, "phone", MAX_SHORT_TEXT_LEN).is_ok());
    }

    #[test]
    fn party_size_minimum() {
        assert!(validate_min(1, "number_of_people", 1).is_ok());
        let err = validate_min(0, "number_of_people", 1).unwrap_err();
        assert_eq!(err.details.unwrap()["field"], "number_of_people");
    }
}
