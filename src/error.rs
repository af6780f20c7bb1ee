// src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::aggregate::AggregateError;
use crate::search::ValidationError;

/// Request-level failures. Per-source problems never end up here.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Aggregate(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ServiceError::Validation(v) => json!({
                "error": "validation_failed",
                "violations": v.violations,
            }),
            ServiceError::Aggregate(e) => {
                tracing::error!(error = %e, "search could not be dispatched");
                json!({
                    "error": "aggregation_unavailable",
                    "message": e.to_string(),
                })
            }
        };
        (status, Json(body)).into_response()
    }
}
