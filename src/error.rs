use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::models::value::ValueKind;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed address: {0}")]
    MalformedAddress(String),

    #[error("Type mismatch in {context}: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: ValueKind,
        actual: ValueKind,
        context: String,
    },

    #[error("Missing field `{field}` in {context}")]
    MissingField { field: String, context: String },

    #[error("Missing required state: {0}")]
    MissingRequiredState(String),

    #[error("Invalid table {table}: {reason}")]
    InvalidTable { table: String, reason: String },

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("State service error: {0}")]
    StateService(String),

    #[error("Malformed state in {context}: {reason}")]
    MalformedState { context: String, reason: String },

    #[error("Invalid parameter `{parameter}`: {source}")]
    InvalidParameter {
        parameter: String,
        source: Box<AppError>,
    },

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn type_mismatch(expected: ValueKind, actual: ValueKind, context: impl Into<String>) -> Self {
        AppError::TypeMismatch {
            expected,
            actual,
            context: context.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>, context: impl Into<String>) -> Self {
        AppError::MissingField {
            field: field.into(),
            context: context.into(),
        }
    }

    pub fn malformed_state(context: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::MalformedState {
            context: context.into(),
            reason: reason.into(),
        }
    }

    /// Attributes the error to a request parameter. Already attributed errors are kept as-is.
    pub fn for_parameter(self, parameter: &str) -> Self {
        match self {
            AppError::InvalidParameter { .. } => self,
            other => AppError::InvalidParameter {
                parameter: parameter.to_string(),
                source: Box::new(other),
            },
        }
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::MalformedAddress(_) => (StatusCode::BAD_REQUEST, "MALFORMED_ADDRESS"),
            AppError::TypeMismatch { .. } => (StatusCode::BAD_REQUEST, "TYPE_MISMATCH"),
            AppError::MissingField { .. } => (StatusCode::BAD_REQUEST, "MISSING_FIELD"),
            AppError::MissingRequiredState(_) => {
                (StatusCode::NOT_FOUND, "MISSING_REQUIRED_STATE")
            }
            AppError::MalformedState { .. } => (StatusCode::BAD_REQUEST, "MALFORMED_STATE"),
            AppError::Codec(_) => (StatusCode::BAD_GATEWAY, "CODEC_ERROR"),
            AppError::StateService(_) => (StatusCode::BAD_GATEWAY, "STATE_SERVICE_ERROR"),
            AppError::InvalidTable { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INVALID_TABLE"),
            AppError::InvalidParameter { source, .. } => source.status_and_code(),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let details = match &self {
            AppError::InvalidParameter { parameter, .. } => {
                Some(serde_json::json!({ "parameter": parameter }))
            }
            _ => None,
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        let body = Json(ErrorResponse {
            success: false,
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details,
            },
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
