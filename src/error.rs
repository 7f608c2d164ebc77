use axum::{
    extract::rejection::QueryRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

pub type ClubsResult<T> = Result<T, ClubsError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClubsError {
    #[error("Missing or invalid API key")]
    Unauthorized,

    #[error("Rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClubsError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ClubsError::Unauthorized => StatusCode::UNAUTHORIZED,
            ClubsError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ClubsError::Validation(_) => StatusCode::BAD_REQUEST,
            ClubsError::Configuration(_) | ClubsError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ClubsError::Unauthorized => "unauthorized",
            ClubsError::RateLimited { .. } => "rate_limit_exceeded",
            ClubsError::Validation(_) => "validation_error",
            ClubsError::Configuration(_) => "configuration_error",
            ClubsError::Internal(_) => "internal_error",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str, code: u16) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            code,
        }
    }

    pub fn from_error(err: &ClubsError) -> Self {
        Self::new(err.kind(), &err.to_string(), err.status_code().as_u16())
    }
}

impl IntoResponse for ClubsError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let mut resp = (status, Json(ErrorResponse::from_error(&self))).into_response();
        if let ClubsError::RateLimited { retry_after_secs } = self {
            resp.headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        resp
    }
}

impl From<envconfig::Error> for ClubsError {
    fn from(err: envconfig::Error) -> Self {
        ClubsError::Configuration(err.to_string())
    }
}

impl From<QueryRejection> for ClubsError {
    fn from(rejection: QueryRejection) -> Self {
        ClubsError::Validation(rejection.body_text())
    }
}
