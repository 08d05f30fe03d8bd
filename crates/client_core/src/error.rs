use shared::error::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a non-success status.
    #[error("server rejected the request with status {status}")]
    Rejected {
        status: u16,
        code: Option<ErrorCode>,
        detail: Option<String>,
    },
    #[error("roster server unreachable or answered garbage: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid server url '{0}'")]
    InvalidServerUrl(String),
}

impl ClientError {
    /// Human message supplied by the server, if it sent one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Rejected { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Rejected { code, .. } => *code,
            _ => None,
        }
    }
}
