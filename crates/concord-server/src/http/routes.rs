use super::{AppError, AppResult, AppState, SERVICE_NAME};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use concord_core::{ReconciliationRequest, ReconciliationResponse};
use serde::Serialize;
use serde_json::json;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/api/reconcile", post(reconcile))
        .route("/api/conflicts/check", post(reconcile))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
    })
}

async fn service_info(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "uptimeSeconds": state.start_time.elapsed().as_secs(),
        "endpoints": {
            "health": "GET /health",
            "reconcile": "POST /api/reconcile",
            "conflicts": "POST /api/conflicts/check",
            "metrics": "GET /metrics",
        },
    }))
}

async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            [(
                header::CONTENT_TYPE,
                "application/openmetrics-text; version=1.0.0; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn reconcile(
    State(state): State<AppState>,
    payload: Result<Json<ReconciliationRequest>, JsonRejection>,
) -> AppResult<Json<ReconciliationResponse>> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected reconcile request: {}", rejection.body_text());
        state.metrics.record_rejected();
        AppError::from(rejection)
    })?;

    let started = Instant::now();
    let entity_count = request.entities.len();

    match state.orchestrator.handle(request).await {
        Ok(response) => {
            state.metrics.record_success(&response, started.elapsed());
            info!(
                "Reconciled {} entities in {}ms",
                entity_count, response.processing_time
            );
            Ok(Json(response))
        }
        Err(e) => {
            state.metrics.record_failure(&e);
            warn!("Reconcile request failed: {}", e);
            Err(e.into())
        }
    }
}
