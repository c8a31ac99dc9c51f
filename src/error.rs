use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// API-level error taxonomy. Every handler returns this; the HTTP mapping
/// lives in one place instead of ad-hoc status tuples.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or missing input, policy violations. 400.
    #[error("{0}")]
    Validation(String),
    /// Duplicate natural key (email, group name). 409.
    #[error("{0}")]
    Conflict(String),
    /// Missing/invalid credentials or token. 401.
    #[error("{0}")]
    Unauthorized(String),
    /// Authenticated but the role is not allowed. 403.
    #[error("{0}")]
    Forbidden(String),
    /// Resource absent. 404.
    #[error("{0}")]
    NotFound(String),
    /// Verification code or link past its window. 400 with a resend hint.
    #[error("{0}")]
    Expired(String),
    /// Store/transport failure. Logged server-side, generic message out.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(msg) | ApiError::Expired(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(err) => {
                error!(error = %err, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error.".to_string())
            }
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_taxonomy_to_statuses() {
        let cases = [
            (ApiError::validation("bad"), StatusCode::BAD_REQUEST),
            (ApiError::Conflict("dup".into()), StatusCode::CONFLICT),
            (ApiError::unauthorized("nope"), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden("role".into()), StatusCode::FORBIDDEN),
            (ApiError::not_found("gone"), StatusCode::NOT_FOUND),
            (ApiError::Expired("old".into()), StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = ApiError::from(anyhow::anyhow!("connection refused"));
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
