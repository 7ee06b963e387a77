//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use shorts_models::PipelineLogEntry;
use shorts_pipeline::PipelineFailure;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineFailure),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let codes: Vec<&str> = errs.iter().map(|e| &*e.code).collect();
                format!("{field} ({})", codes.join(", "))
            })
            .collect();
        fields.sort();
        Self::Validation(format!("invalid fields: {}", fields.join("; ")))
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    logs: Option<Vec<PipelineLogEntry>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self {
            ApiError::Pipeline(failure) => ErrorResponse {
                success: false,
                error: failure.error.to_string(),
                logs: Some(failure.logs),
            },
            // Don't expose internal error details in production
            ApiError::Internal(_) if std::env::var("ENVIRONMENT").unwrap_or_default() == "production" => {
                ErrorResponse {
                    success: false,
                    error: "An internal error occurred".to_string(),
                    logs: None,
                }
            }
            other => ErrorResponse {
                success: false,
                error: other.to_string(),
                logs: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shorts_pipeline::PipelineError;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Validation("x".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );

        let failure = PipelineFailure {
            error: PipelineError::Timeout(300),
            logs: Vec::new(),
        };
        assert_eq!(
            ApiError::from(failure).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
