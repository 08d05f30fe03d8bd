//! Transport-level input checks applied before the roster store is consulted.

use crate::error::ApiError;

const MAX_EMAIL_BYTES: usize = 254;

pub fn activity_name(raw: &str) -> Result<&str, ApiError> {
    if raw.trim().is_empty() {
        return Err(ApiError::validation("Activity name must not be empty"));
    }
    Ok(raw)
}

pub fn email(raw: Option<&str>) -> Result<&str, ApiError> {
    let Some(raw) = raw.filter(|value| !value.is_empty()) else {
        return Err(ApiError::validation("Email is required"));
    };
    if is_well_formed_email(raw) {
        Ok(raw)
    } else {
        Err(ApiError::validation("Invalid email address"))
    }
}

pub fn is_well_formed_email(value: &str) -> bool {
    if value.len() > MAX_EMAIL_BYTES {
        return false;
    }
    if value
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || c == char::REPLACEMENT_CHARACTER)
    {
        return false;
    }

    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    domain.contains('.') && domain.split('.').all(|label| !label.is_empty())
}
