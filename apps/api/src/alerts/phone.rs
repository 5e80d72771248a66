//! Ethiopian mobile number normalization.

use crate::errors::AppError;

const COUNTRY_CODE: &str = "251";

/// Normalizes a free-form phone string to E.164-like form
/// (`+251` + 9-digit national number).
///
/// All non-digit characters are stripped first, then:
/// - 10 digits starting `09`: the national trunk prefix `0` is replaced by
///   the country calling code.
/// - 9 digits starting `9`: the country calling code is prepended.
/// - 12 digits starting `2519` (covers inputs already carrying `+251`):
///   passed through with exactly one leading `+`.
///
/// Anything else is rejected and must never reach the SMS gateway.
/// Idempotent: normalizing an already-normalized number returns it unchanged.
pub fn normalize_phone(raw: &str) -> Result<String, AppError> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    let national = if digits.len() == 10 && digits.starts_with("09") {
        &digits[1..]
    } else if digits.len() == 9 && digits.starts_with('9') {
        digits.as_str()
    } else if digits.len() == 12 && digits.starts_with("2519") {
        &digits[3..]
    } else {
        return Err(AppError::InvalidPhoneFormat(format!(
            "'{raw}' is not a valid Ethiopian mobile number"
        )));
    };

    Ok(format!("+{COUNTRY_CODE}{national}"))
}
