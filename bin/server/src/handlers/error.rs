use actix_web::http::header::{self, ContentType};
use actix_web::http::{Method, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;
use tracing::error;

/// Errors returned to the client as a status code and a plain-text body
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    MethodNotAllowed {
        allowed: Method,
        message: &'static str,
    },

    #[error("{0}")]
    BadRequest(String),

    #[error("Wrong password: upload not authorized")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn method_not_allowed(allowed: Method, message: &'static str) -> Self {
        ApiError::MethodNotAllowed { allowed, message }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        response.insert_header(ContentType::plaintext());
        if let ApiError::MethodNotAllowed { allowed, .. } = self {
            response.insert_header((header::ALLOW, allowed.as_str()));
        }
        response.body(self.to_string())
    }
}

/// Helper function for server errors
pub fn handle_server_error<E: std::fmt::Display>(msg: &str, e: E) -> ApiError {
    error!("{}: {}", msg, e);
    ApiError::Internal(format!("{}: {}", msg, e))
}
