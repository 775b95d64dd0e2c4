use crate::cors::{answer_options, cors_layer};
use crate::frontend;
use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{middleware, Extension, Json, Router};
use maizebus::config::CorsConfig;
use maizebus::forms::{form_router, FormRelayService};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Form endpoints plus operational routes, the client fallback, and CORS.
pub(crate) fn with_service_routes(
    service: Arc<FormRelayService>,
    cors: &CorsConfig,
    state: AppState,
) -> Router {
    form_router(service)
        .route("/health", get(healthcheck))
        .route("/api/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .fallback(frontend::fallback)
        .layer(middleware::from_fn(answer_options))
        .layer(cors_layer(cors))
        .layer(Extension(state))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "OK", "message": "MaizeBus Backend is running" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    if state.readiness.load(Ordering::Acquire) {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "initializing" })),
        )
    }
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
