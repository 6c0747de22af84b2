use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Request-path error taxonomy. Every variant maps to a stable HTTP status
/// and a JSON `{"error": "..."}` body; server-side variants log their
/// detail and answer with a generic message only.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    // One message for both expiry and mismatch: callers must not be able
    // to tell which one happened.
    #[error("Invalid or expired OTP")]
    OtpInvalid,

    // Combined message: does not reveal whether phone or email collided.
    #[error("User already exists with this phone or email")]
    UserExists,

    #[error("User not found or account inactive")]
    UserNotFound,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Account is temporarily locked. Please try again later.")]
    AccountLocked,

    #[error("identifier space exhausted after {0} attempts")]
    IdentifierSpaceExhausted(u32),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::OtpInvalid
            | ApiError::UserExists => StatusCode::BAD_REQUEST,
            ApiError::UserNotFound | ApiError::InvalidPassword => StatusCode::UNAUTHORIZED,
            ApiError::AccountLocked => StatusCode::FORBIDDEN,
            ApiError::IdentifierSpaceExhausted(_)
            | ApiError::Hashing(_)
            | ApiError::Token(_)
            | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
            return HttpResponse::build(status).json(json!({
                "error": "Something went wrong. Please try again."
            }));
        }
        HttpResponse::build(status).json(json!({ "error": self.to_string() }))
    }
}

/// Flattens the first `validator` message into our 400 shape, so handlers
/// can `request.validate().map_err(validation_error)?`.
pub fn validation_error(errors: validator::ValidationErrors) -> ApiError {
    let message = errors
        .field_errors()
        .into_values()
        .flatten()
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Invalid request".to_string());
    ApiError::Validation(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_400() {
        assert_eq!(
            ApiError::Validation("Invalid phone number".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::OtpInvalid.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::UserExists.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn auth_errors_map_to_401_and_403() {
        assert_eq!(ApiError::UserNotFound.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::InvalidPassword.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::AccountLocked.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn server_errors_hide_detail() {
        let err = ApiError::IdentifierSpaceExhausted(16);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn otp_failures_share_one_message() {
        assert_eq!(ApiError::OtpInvalid.to_string(), "Invalid or expired OTP");
    }
}
