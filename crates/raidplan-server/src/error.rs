//! Mapping of core errors onto HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use raidplan_core::{EditorError, StorageError, TokenError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Editor(#[from] EditorError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

fn storage_status(error: &StorageError) -> StatusCode {
    match error {
        StorageError::NotFound(_) => StatusCode::NOT_FOUND,
        StorageError::SaveInFlight(_) => StatusCode::CONFLICT,
        StorageError::ReadOnly(_) => StatusCode::FORBIDDEN,
        StorageError::Serialization(_) | StorageError::Io(_) | StorageError::Other(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Token(TokenError::Malformed) => StatusCode::BAD_REQUEST,
            ApiError::Token(TokenError::UnknownPlan) => StatusCode::NOT_FOUND,
            ApiError::Token(TokenError::Storage(e)) => storage_status(e),
            ApiError::Editor(EditorError::PermissionDenied { .. }) => StatusCode::FORBIDDEN,
            ApiError::Editor(EditorError::Storage(e)) => storage_status(e),
            ApiError::Editor(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Storage(e) => storage_status(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected ({}): {}", status, self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::from(TokenError::Malformed).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::from(TokenError::UnknownPlan).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(EditorError::PermissionDenied { operation: "update plan" }).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(ApiError::from(EditorError::OnlyTab).status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            ApiError::from(StorageError::SaveInFlight("k".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(StorageError::Io("disk".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
