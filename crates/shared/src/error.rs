use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    AlreadyRegistered,
    Full,
    NotRegistered,
    Validation,
    #[default]
    Internal,
}

impl ErrorCode {
    pub fn http_status(self) -> u16 {
        match self {
            ErrorCode::NotFound => 404,
            ErrorCode::AlreadyRegistered
            | ErrorCode::Full
            | ErrorCode::NotRegistered
            | ErrorCode::Validation => 400,
            ErrorCode::Internal => 500,
        }
    }
}

/// Rule violations raised by the roster store. The display text is what the
/// administrator ends up reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("Activity not found")]
    NotFound,
    #[error("Student already signed up for this activity")]
    AlreadyRegistered,
    #[error("Activity is full")]
    Full,
    #[error("Student not signed up for this activity")]
    NotRegistered,
}

impl RosterError {
    pub fn code(self) -> ErrorCode {
        match self {
            RosterError::NotFound => ErrorCode::NotFound,
            RosterError::AlreadyRegistered => ErrorCode::AlreadyRegistered,
            RosterError::Full => ErrorCode::Full,
            RosterError::NotRegistered => ErrorCode::NotRegistered,
        }
    }
}

/// Failure body returned by the service boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: ErrorCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: detail.into(),
        }
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, detail)
    }

    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }
}

impl From<RosterError> for ApiError {
    fn from(value: RosterError) -> Self {
        Self::new(value.code(), value.to_string())
    }
}
