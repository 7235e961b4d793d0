use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::error;

pub const LOGIN_ROUTE: &str = "/auth/login";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        message: String,
        details: Option<Value>,
    },

    #[error("Email Already Exist.")]
    DuplicateEmail,

    #[error("Invalid Credentials.")]
    InvalidCredentials,

    #[error("Please verify your email to login")]
    EmailNotVerified,

    #[error("Invalid Token")]
    InvalidToken,

    #[error("Token expired")]
    ExpiredToken,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Device ID missing")]
    MissingDevice,

    #[error("Login required after {quota} uses")]
    QuotaExceeded { quota: i32 },

    #[error("{0}")]
    RateLimited(&'static str),

    #[error("{error}")]
    Upstream { error: String, details: String },

    #[error("Only code files with supported extensions are allowed.")]
    UnsupportedFileType,

    #[error("Field size too large. Max 2MB allowed.")]
    FieldTooLarge,

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            details: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. }
            | AppError::DuplicateEmail
            | AppError::MissingDevice
            | AppError::UnsupportedFileType
            | AppError::FieldTooLarge
            | AppError::Upstream { .. } => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials
            | AppError::EmailNotVerified
            | AppError::InvalidToken
            | AppError::ExpiredToken
            | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::QuotaExceeded { .. } => StatusCode::FORBIDDEN,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Uniform failure envelope shared by every JSON endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_expired: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_route: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<&'static str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = ErrorBody {
            success: false,
            error: self.to_string(),
            details: None,
            token_expired: None,
            redirect_route: None,
            redirect: None,
        };

        match self {
            AppError::Validation { details, .. } => body.details = details,
            AppError::Upstream { details, .. } => body.details = Some(Value::String(details)),
            AppError::ExpiredToken => {
                body.token_expired = Some(true);
                body.redirect_route = Some(LOGIN_ROUTE);
            }
            AppError::QuotaExceeded { .. } => body.redirect = Some(LOGIN_ROUTE),
            AppError::Internal(e) => {
                error!(error = ?e, "internal error");
            }
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}
