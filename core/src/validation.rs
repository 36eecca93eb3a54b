//! Form checks run before any network call.

use crate::error::ValidationError;

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn validate_complaint_text(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyComplaintText);
    }
    Ok(())
}

/// Mismatch is reported before length, matching the order users see.
pub fn validate_signup(password: &str, confirm_password: &str) -> Result<(), ValidationError> {
    if password != confirm_password {
        return Err(ValidationError::PasswordMismatch);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort { min: MIN_PASSWORD_LEN });
    }
    Ok(())
}
