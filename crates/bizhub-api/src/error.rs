// ============================================================================
// BizHub API - Error Mapping
// File: crates/bizhub-api/src/error.rs
// ============================================================================

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bizhub_core::DomainError;
use thiserror::Error;

use crate::response::ApiResponse;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    /// Status, machine-readable code and client-facing message
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE", msg.clone()),
            ApiError::Domain(err) => {
                let (status, code) = match err {
                    DomainError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                    DomainError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
                    DomainError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
                    DomainError::UserNotActive => (StatusCode::FORBIDDEN, "USER_NOT_ACTIVE"),
                    DomainError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
                    DomainError::TooManyAttempts => (StatusCode::TOO_MANY_REQUESTS, "TOO_MANY_ATTEMPTS"),
                    DomainError::InvalidTransition { .. } => (StatusCode::BAD_REQUEST, "INVALID_TRANSITION"),
                    DomainError::ValidationError(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                    DomainError::PasswordTooShort | DomainError::PasswordTooLong | DomainError::PasswordTooWeak => {
                        (StatusCode::BAD_REQUEST, "WEAK_PASSWORD")
                    }
                    DomainError::EmailAlreadyExists(_) => (StatusCode::CONFLICT, "EMAIL_ALREADY_EXISTS"),
                    DomainError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
                    DomainError::PasswordHashError(_)
                    | DomainError::TokenGenerationError(_)
                    | DomainError::DatabaseError(_)
                    | DomainError::InternalError(_) => {
                        return (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            "INTERNAL_ERROR",
                            "An internal error occurred".to_string(),
                        );
                    }
                };
                (status, code, err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            tracing::error!("{}: {}", code, self);
        } else {
            tracing::warn!("{}: {}", code, self);
        }

        (status, Json(ApiResponse::error(code, &message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_map_to_status_codes() {
        let cases = [
            (DomainError::not_found("Contract", "x"), StatusCode::NOT_FOUND),
            (DomainError::forbidden("no"), StatusCode::FORBIDDEN),
            (DomainError::ValidationError("bad".into()), StatusCode::BAD_REQUEST),
            (DomainError::invalid_transition("DRAFT", "EXPIRED"), StatusCode::BAD_REQUEST),
            (DomainError::Conflict("dup".into()), StatusCode::CONFLICT),
            (DomainError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (DomainError::TooManyAttempts, StatusCode::TOO_MANY_REQUESTS),
            (DomainError::DatabaseError("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).parts().0, expected);
        }
    }

    #[test]
    fn test_internal_details_are_not_exposed() {
        let (_, code, message) = ApiError::from(DomainError::DatabaseError("relation missing".into())).parts();
        assert_eq!(code, "INTERNAL_ERROR");
        assert!(!message.contains("relation"));
    }
}
