//! Error types for the Wordstream server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::document::{ParseError, ParseErrorKind, PositionError};

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Load superseded by a newer request")]
    Superseded,

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Position(#[from] PositionError),
}

/// Error response body for non-parse failures
#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
}

/// HTTP status for a parse failure
pub fn parse_error_status(kind: ParseErrorKind) -> StatusCode {
    match kind {
        ParseErrorKind::FileTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        ParseErrorKind::UnsupportedFormat => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        ParseErrorKind::DrmProtected => StatusCode::FORBIDDEN,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            AppError::Parse(e) => {
                tracing::debug!("Parse error response: {:?}", e.kind);
                return (parse_error_status(e.kind), Json(e)).into_response();
            }
            AppError::Position(e) => (StatusCode::NOT_FOUND, "position_not_found", e.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            AppError::Superseded => (
                StatusCode::CONFLICT,
                "superseded",
                "A newer document load replaced this one".to_string(),
            ),
        };

        (status, Json(ErrorResponse { error, message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_statuses() {
        assert_eq!(
            parse_error_status(ParseErrorKind::FileTooLarge),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            parse_error_status(ParseErrorKind::UnsupportedFormat),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            parse_error_status(ParseErrorKind::DrmProtected),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            parse_error_status(ParseErrorKind::EmptyFile),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_position_error_is_not_found() {
        let response =
            AppError::from(PositionError::WordOutOfRange { index: 9, len: 3 }).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
