use axum::http::StatusCode;

use crate::payload::InvalidField;
use crate::telegram::DeliveryError;

/// Every way a relay request can fail. Each variant maps to one status code
/// and one envelope `error` string.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("telegram bot token or chat id missing")]
    NotConfigured,
    #[error("invalid payload: {0:?}")]
    InvalidPayload(InvalidField),
    #[error("telegram rejected the message: {0}")]
    Telegram(String),
    #[error("request to telegram failed: {0}")]
    RequestFailed(String),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            RelayError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            RelayError::Telegram(_) => StatusCode::BAD_GATEWAY,
            RelayError::RequestFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The machine-readable code placed in the response envelope.
    pub fn code(&self) -> String {
        match self {
            RelayError::MethodNotAllowed => "method_not_allowed".to_string(),
            RelayError::NotConfigured => "telegram_not_configured".to_string(),
            RelayError::InvalidPayload(_) => "invalid_payload".to_string(),
            RelayError::Telegram(description) => format!("telegram_error: {description}"),
            RelayError::RequestFailed(_) => "request_failed".to_string(),
        }
    }
}

impl From<DeliveryError> for RelayError {
    fn from(err: DeliveryError) -> Self {
        match err {
            DeliveryError::Transport(e) => RelayError::RequestFailed(e),
            DeliveryError::Api(description) => RelayError::Telegram(description),
        }
    }
}
