//! JSON error responses.
//!
//! Every error body carries an `error` string. Server-side failures add the
//! underlying cause as `message`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::storage::StoreError;

/// Error returned by query and probe handlers.
#[derive(Debug)]
pub enum ApiError {
    NotFound(&'static str),
    Store(StoreError),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Store(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(what) => {
                (StatusCode::NOT_FOUND, Json(ErrorBody::new(what))).into_response()
            }
            ApiError::Store(e) => {
                tracing::error!(error = %e, kind = ?e.kind(), "Query failed");
                let body = ErrorBody {
                    error: "Internal server error".to_string(),
                    message: Some(e.to_string()),
                };
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

/// Fallback for unknown paths.
pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(ErrorBody::new("Endpoint not found"))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let response = ApiError::NotFound("No weather data available").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = ApiError::Store(StoreError::Read("boom".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_message_only_on_server_errors() {
        let body = serde_json::to_value(ErrorBody::new("Endpoint not found")).unwrap();
        assert_eq!(body, serde_json::json!({"error": "Endpoint not found"}));
    }
}
