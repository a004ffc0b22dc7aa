//! HTTP error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use taskdeck_core::{CoreError, ErrorKind};
use tracing::error;

/// An error rendered as `{"error": <message>}` with a matching status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let status = match err.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            // Known caller without a membership on a gated route.
            ErrorKind::Unauthorized | ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Invalid => StatusCode::BAD_REQUEST,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %err, "Request failed");
            return Self::new(status, "internal error");
        }
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskdeck_core::Permission;
    use taskdeck_db::DbError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (CoreError::BoardNotFound("b".into()), StatusCode::NOT_FOUND),
            (CoreError::EmailTaken("a@b.c".into()), StatusCode::CONFLICT),
            (CoreError::not_a_member("b", "u"), StatusCode::FORBIDDEN),
            (
                CoreError::forbidden("viewer", Permission::Edit.into()),
                StatusCode::FORBIDDEN,
            ),
            (CoreError::validation("bad"), StatusCode::BAD_REQUEST),
            (
                CoreError::Database(DbError::NotFound("x".into())),
                StatusCode::NOT_FOUND,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_internal_errors_are_not_leaked() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let api = ApiError::from(CoreError::Json(err));
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.message, "internal error");
    }
}
