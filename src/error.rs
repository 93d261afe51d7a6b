//! Gateway error types

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Why a credential was rejected. Only ever logged, callers see a bare 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("authorization header missing")]
    MissingHeader,

    #[error("authorization header has no token after the scheme")]
    MissingToken,

    #[error("token does not match USER<ddd>")]
    TokenMismatch,
}

impl AuthFailure {
    pub fn as_label(&self) -> &'static str {
        match self {
            AuthFailure::MissingHeader => "missing_header",
            AuthFailure::MissingToken => "missing_token",
            AuthFailure::TokenMismatch => "token_mismatch",
        }
    }
}

/// Request-terminating errors. Neither variant mutates rate state.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] AuthFailure),

    #[error("rate limit exceeded for {identity}")]
    RateLimitExceeded { identity: String },
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            GatewayError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Body text shown to the caller.
    pub fn public_message(&self) -> &'static str {
        match self {
            GatewayError::Unauthorized(_) => "Unauthorized",
            GatewayError::RateLimitExceeded { .. } => "Rate Limit Exceeded",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "message": self.public_message() }));
        (self.status(), body).into_response()
    }
}

/// Startup configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

pub type GatewayResult<T> = Result<T, GatewayError>;
