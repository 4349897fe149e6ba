//! REST API endpoints.
//!
//! Axum-based HTTP API serving per-floor statistics to the dashboard and
//! accepting refresh triggers.

pub mod routes;
pub mod state;

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::query::QueryError;
use crate::storage::StorageError;

use self::state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unknown floor: {0}")]
    UnknownFloor(String),

    #[error("Statistics not available yet: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::UnknownFloor(_) => (StatusCode::NOT_FOUND, "UNKNOWN_FLOOR"),
            ApiError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "NOT_READY"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::UnknownFloor(floor) => ApiError::UnknownFloor(floor),
            QueryError::Storage(StorageError::TableMissing(kind)) => {
                ApiError::Unavailable(format!("{} has not been built", kind))
            }
            QueryError::Storage(e) => ApiError::Internal(e.to_string()),
        }
    }
}

/// CORS for the dashboard. `"*"` allows any origin.
pub fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origin == "*" {
        return layer.allow_origin(Any);
    }
    match HeaderValue::from_str(origin) {
        Ok(value) => layer.allow_origin(value),
        Err(_) => {
            warn!("Invalid CORS origin {:?}, allowing any origin", origin);
            layer.allow_origin(Any)
        }
    }
}

pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/floors", get(routes::stats::floors))
        .route("/stats/all/:floor", get(routes::stats::all_stats))
        .route("/update", post(routes::refresh::update))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TableKind;

    #[test]
    fn test_query_error_mapping() {
        let err: ApiError = QueryError::UnknownFloor("999".to_string()).into();
        assert!(matches!(err, ApiError::UnknownFloor(ref f) if f == "999"));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);

        let err: ApiError = QueryError::Storage(StorageError::TableMissing(TableKind::WinRates)).into();
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);

        let err: ApiError = QueryError::Storage(StorageError::Malformed {
            kind: TableKind::PlayRates,
            reason: "bad".to_string(),
        })
        .into();
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
