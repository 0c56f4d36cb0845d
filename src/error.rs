use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Domain error carried through every handler. Each variant maps to one HTTP
/// status; the boundary renders it as `{"status": ..., "message": ...}` with
/// `"fail"` for client errors and `"error"` for server errors.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthenticated(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Delivery(String),
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Delivery(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn internal<E: Into<anyhow::Error>>(e: E) -> Self {
        ApiError::Internal(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // The underlying cause of an internal error stays in the logs.
        let message = match &self {
            ApiError::Internal(source) => {
                error!(error = %source, "internal error");
                "Something went wrong".to_string()
            }
            other => other.to_string(),
        };
        let kind = if status.is_client_error() { "fail" } else { "error" };
        let body = Json(json!({ "status": kind, "message": message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_kinds() {
        assert_eq!(
            ApiError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthenticated("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Delivery("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_error_hides_cause() {
        let err = ApiError::internal(anyhow::anyhow!("connection refused"));
        assert_eq!(err.to_string(), "internal error");
    }
}
