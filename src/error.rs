// src/error.rs
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// A single rejected request field, reported back to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Ethereum provider error: {0}")]
    Provider(String),

    #[error("Factory call failed: {0}")]
    Contract(String),
}

#[derive(Error, Debug)]
pub enum PaymasterError {
    #[error("Invalid {field}: {reason}")]
    InvalidValidityWindow { field: &'static str, reason: String },

    #[error("Paymaster address not configured")]
    PaymasterNotConfigured,

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("System clock error: {0}")]
    Clock(String),
}

/// Every failure a route can produce. Rendered as a uniform JSON envelope.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    Configuration(String),

    #[error("Paymaster signing failed: {0}")]
    SigningFailed(String),

    #[error("Upstream RPC unavailable: {0}")]
    UpstreamUnavailable(#[from] ChainError),

    #[error("Endpoint not found")]
    NotFound,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Configuration(_) | ApiError::SigningFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            ApiError::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl From<PaymasterError> for ApiError {
    fn from(err: PaymasterError) -> Self {
        match err {
            PaymasterError::InvalidValidityWindow { field, reason } => {
                ApiError::Validation(vec![FieldError::new(field, reason)])
            }
            PaymasterError::PaymasterNotConfigured => ApiError::Configuration(err.to_string()),
            PaymasterError::SigningFailed(msg) => ApiError::SigningFailed(msg),
            PaymasterError::Clock(_) => ApiError::Configuration(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(vec![FieldError::new("body", rejection.body_text())])
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation(errors) => json!({
                "error": "Validation failed",
                "errors": errors,
            }),
            ApiError::Configuration(msg) => {
                error!("Configuration error: {}", msg);
                json!({ "error": msg })
            }
            ApiError::SigningFailed(msg) => {
                error!("Paymaster signing failed: {}", msg);
                json!({ "error": "Paymaster signing failed" })
            }
            ApiError::UpstreamUnavailable(e) => {
                error!("Upstream RPC call failed: {}", e);
                json!({ "error": "Upstream RPC unavailable" })
            }
            ApiError::NotFound => json!({ "error": "Endpoint not found" }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_errors_become_field_errors() {
        let err: ApiError = PaymasterError::InvalidValidityWindow {
            field: "validUntil",
            reason: "validUntil must be greater than validAfter".to_string(),
        }
        .into();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        match err {
            ApiError::Validation(errors) => assert_eq!(errors[0].field, "validUntil"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn taxonomy_status_codes() {
        assert_eq!(
            ApiError::from(PaymasterError::PaymasterNotConfigured).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(ChainError::Provider("timeout".into())).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
    }
}
