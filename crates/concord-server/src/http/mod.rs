pub mod metrics;
mod routes;

pub use metrics::ConcordMetrics;
pub use routes::create_router;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use concord_core::{ConcordError, RequestOrchestrator};
use serde::Serialize;
use std::sync::Arc;

pub const SERVICE_NAME: &str = "name-reconciliation-api";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<RequestOrchestrator>,
    pub metrics: Arc<ConcordMetrics>,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(orchestrator: RequestOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            metrics: Arc::new(ConcordMetrics::new()),
            start_time: std::time::Instant::now(),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Error type for HTTP handlers
pub enum AppError {
    BadRequest(String),
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

impl From<ConcordError> for AppError {
    fn from(err: ConcordError) -> Self {
        if err.is_client_error() {
            AppError::BadRequest(err.to_string())
        } else {
            AppError::Internal(err.into())
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(format!("Invalid JSON in request body: {}", rejection.body_text()))
    }
}

pub type AppResult<T> = Result<T, AppError>;
