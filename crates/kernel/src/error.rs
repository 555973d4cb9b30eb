//! Application error types.
//!
//! Every failure in the editor pipeline is converted to [`EditorError`] and
//! then, at the route boundary, to the uniform
//! `{ "success": false, "error": ..., "fieldErrors": ... }` JSON envelope.
//! Nothing propagates past that boundary.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::schema::FieldErrors;

/// Editor pipeline errors.
#[derive(Debug, Error)]
pub enum EditorError {
    /// Submitted content failed its type's schema. Carries the full
    /// field-path → messages map; never partially applied.
    #[error("validation failed")]
    Validation(FieldErrors),

    /// No authenticated user. Distinct from [`EditorError::Forbidden`] so
    /// callers can tell "log in" apart from "insufficient role".
    #[error("not authenticated")]
    Unauthenticated,

    /// Authenticated but lacking rights for the requested scope.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Referenced template/block does not exist or does not belong to the
    /// stated parent. Deliberately identical in both cases to avoid
    /// existence leakage.
    #[error("not found")]
    NotFound,

    /// Storage constraint violation (e.g. duplicate ordering). The caller
    /// should reload and retry the whole operation.
    #[error("conflict, reload and retry")]
    Conflict,

    /// Any other failure. Logged with full context server-side, surfaced as
    /// an opaque message.
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for EditorError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e
            && db.is_unique_violation()
        {
            return EditorError::Conflict;
        }
        EditorError::Internal(anyhow::Error::new(e).context("database error"))
    }
}

impl IntoResponse for EditorError {
    fn into_response(self) -> Response {
        let status = match &self {
            EditorError::Validation(_) => StatusCode::BAD_REQUEST,
            EditorError::Unauthenticated => StatusCode::UNAUTHORIZED,
            EditorError::Forbidden(_) => StatusCode::FORBIDDEN,
            EditorError::NotFound => StatusCode::NOT_FOUND,
            EditorError::Conflict => StatusCode::CONFLICT,
            EditorError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match &self {
            EditorError::Internal(e) => {
                tracing::error!(error = ?e, "internal error in editor pipeline");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        let mut body = serde_json::json!({
            "success": false,
            "error": message,
        });
        if let EditorError::Validation(errors) = &self {
            body["fieldErrors"] = serde_json::to_value(errors).unwrap_or_default();
        }

        (status, Json(body)).into_response()
    }
}

/// Result type alias using EditorError.
pub type EditorResult<T> = Result<T, EditorError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn unauthenticated_and_forbidden_are_distinct() {
        let unauth = EditorError::Unauthenticated.into_response();
        let forbidden = EditorError::Forbidden("insufficient role".into()).into_response();
        assert_eq!(unauth.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn validation_maps_to_bad_request() {
        let mut errors = FieldErrors::new();
        errors.push("primaryColor", "must be a 6-digit hex color");
        let response = EditorError::Validation(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn conflict_maps_to_409() {
        let response = EditorError::Conflict.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
