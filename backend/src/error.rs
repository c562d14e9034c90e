//! Error handling for the Crop Yield Prediction service
//!
//! Input and label errors are the caller's to fix (400). Model and internal
//! failures are service errors (500). Environmental failures never reach this
//! type; they are absorbed by fallbacks.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::{CategoricalField, EncodeError};
use thiserror::Error;
use validator::ValidationErrors;

use crate::services::predictor::ModelError;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Input errors
    #[error("Invalid input: {message}")]
    InvalidInput {
        field: Option<String>,
        message: String,
    },

    #[error("Validation error on {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Unrecognized {field} '{value}'")]
    UnrecognizedLabel {
        field: CategoricalField,
        value: String,
    },

    // Service errors
    #[error("Model failure: {0}")]
    ModelFailure(#[from] ModelError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput { .. }
            | AppError::Validation { .. }
            | AppError::UnrecognizedLabel { .. } => StatusCode::BAD_REQUEST,
            AppError::ModelFailure(_)
            | AppError::Configuration(_)
            | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidInput { .. } => "INVALID_INPUT",
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::UnrecognizedLabel { .. } => "UNRECOGNIZED_LABEL",
            AppError::ModelFailure(_) => "MODEL_FAILURE",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    fn body(&self) -> ErrorResponse {
        let (error, field) = match self {
            AppError::InvalidInput { field, message } => (message.clone(), field.clone()),
            AppError::Validation { field, message } => {
                (format!("{}: {}", field, message), Some(field.clone()))
            }
            AppError::UnrecognizedLabel { field, value } => (
                format!(
                    "{} '{}' is not recognized. Please choose a value known to the model.",
                    field, value
                ),
                Some(field.key().to_string()),
            ),
            AppError::ModelFailure(_) => (
                "The prediction model could not produce an estimate".to_string(),
                None,
            ),
            AppError::Configuration(msg) => (format!("Configuration error: {}", msg), None),
            AppError::InternalError(_) => ("An internal server error occurred".to_string(), None),
        };

        ErrorResponse {
            success: false,
            error,
            code: self.code(),
            field,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::info!("Rejected request: {}", self);
        }

        (status, Json(self.body())).into_response()
    }
}

impl From<EncodeError> for AppError {
    fn from(err: EncodeError) -> Self {
        match err {
            EncodeError::UnrecognizedLabel { field, value } => {
                AppError::UnrecognizedLabel { field, value }
            }
            other => AppError::Configuration(other.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput {
            field: None,
            message: rejection.body_text(),
        }
    }
}

/// Field order used to pick the reported validation error
const REQUEST_FIELDS: [&str; 6] = ["state", "district", "season", "crop", "area", "postal_code"];

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let field_errors = errors.field_errors();
        let first = REQUEST_FIELDS
            .iter()
            .find_map(|name| field_errors.get(name).map(|errs| (*name, *errs)))
            .or_else(|| field_errors.iter().next().map(|(name, errs)| (*name, *errs)));

        match first {
            Some((field, errs)) => {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| "is invalid".to_string());
                AppError::Validation {
                    field: field.to_string(),
                    message,
                }
            }
            None => AppError::InvalidInput {
                field: None,
                message: errors.to_string(),
            },
        }
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
