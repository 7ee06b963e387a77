//! Client error types.

use reqwest::{Response, StatusCode};
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

/// Errors returned by the service clients.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{service} request timed out")]
    Timeout { service: &'static str },

    #[error("{service} rate limited the request")]
    RateLimited { service: &'static str },

    #[error("{service} unavailable ({status}): {message}")]
    Unavailable {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("{service} rejected the request ({status}): {message}")]
    Rejected {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response from {service}: {message}")]
    InvalidResponse {
        service: &'static str,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Media error: {0}")]
    Media(#[from] shorts_media::MediaError),
}

impl ClientError {
    pub fn invalid_response(service: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            service,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Map a transport error, surfacing client-side timeouts as `Timeout`.
    pub fn from_reqwest(service: &'static str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout { service }
        } else {
            Self::Network(e)
        }
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(service: &'static str, status: StatusCode, body: impl Into<String>) -> Self {
        let message = truncate_body(body.into());
        match status {
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited { service },
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => Self::Timeout { service },
            s if s.is_server_error() => Self::Unavailable {
                service,
                status: s.as_u16(),
                message,
            },
            s => Self::Rejected {
                service,
                status: s.as_u16(),
                message,
            },
        }
    }

    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Timeout { .. }
            | ClientError::RateLimited { .. }
            | ClientError::Unavailable { .. } => true,
            ClientError::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}

/// Return the response unchanged on 2xx, otherwise a classified error
/// carrying the response body.
pub(crate) async fn ensure_success(service: &'static str, response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::from_status(service, status, body))
}

fn truncate_body(body: String) -> String {
    const MAX: usize = 500;
    if body.chars().count() <= MAX {
        body
    } else {
        body.chars().take(MAX).collect::<String>() + "…"
    }
}
