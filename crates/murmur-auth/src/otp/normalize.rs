//! Identifier normalisation.

use murmur_core::error::AppError;

/// Country code prepended to phone numbers that lack one.
const DEFAULT_COUNTRY_CODE: &str = "91";

/// Canonical form of an email address or phone number.
///
/// Emails are trimmed and lower-cased. Phone numbers keep digits only,
/// gain the default country code when it is missing, and get a leading `+`.
pub fn normalize_identifier(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("Identifier must not be empty"));
    }

    if trimmed.contains('@') {
        return Ok(trimmed.to_lowercase());
    }

    let mut digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(AppError::validation(format!(
            "'{trimmed}' is neither an email address nor a phone number"
        )));
    }
    if !digits.starts_with(DEFAULT_COUNTRY_CODE) {
        digits.insert_str(0, DEFAULT_COUNTRY_CODE);
    }

    Ok(format!("+{digits}"))
}

/// Whether a normalised identifier is an email address.
pub fn is_email(identifier: &str) -> bool {
    identifier.contains('@')
}
