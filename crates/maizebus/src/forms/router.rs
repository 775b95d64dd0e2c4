use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use tracing::{debug, error, info};

use crate::mail::Delivery;

use super::body::read_submission;
use super::service::FormRelayService;
use super::{FormKind, FormResponse, SubmissionError};

pub const CONTACT_PATH: &str = "/api/contact";
pub const JOIN_PATH: &str = "/api/join";

/// Room for the text fields and multipart framing around a maximum-size resume.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

pub fn form_router(service: Arc<FormRelayService>) -> Router {
    let join_limit = service.resume_policy().max_bytes() + MULTIPART_OVERHEAD;

    Router::new()
        .route(
            CONTACT_PATH,
            post(contact_handler).fallback(method_not_allowed),
        )
        .route(
            JOIN_PATH,
            post(join_handler)
                .fallback(method_not_allowed)
                .layer(DefaultBodyLimit::max(join_limit)),
        )
        .with_state(service)
}

pub(crate) async fn contact_handler(
    State(service): State<Arc<FormRelayService>>,
    request: Request,
) -> Response {
    let result = match read_submission(request, None).await {
        Ok(submission) => service.submit_contact(&submission.fields).await,
        Err(err) => Err(err),
    };
    respond(FormKind::Contact, result)
}

pub(crate) async fn join_handler(
    State(service): State<Arc<FormRelayService>>,
    request: Request,
) -> Response {
    let result = match read_submission(request, Some(service.resume_policy())).await {
        Ok(submission) => {
            service
                .submit_application(&submission.fields, submission.resume)
                .await
        }
        Err(err) => Err(err),
    };
    respond(FormKind::Join, result)
}

fn respond(kind: FormKind, result: Result<Delivery, SubmissionError>) -> Response {
    match result {
        Ok(Delivery::Sent) => {
            info!(form = kind.label(), "notification sent");
            (
                StatusCode::OK,
                Json(FormResponse::accepted(kind.sent_message())),
            )
                .into_response()
        }
        Ok(Delivery::NotConfigured) => (
            StatusCode::OK,
            Json(FormResponse::accepted(kind.logged_message())),
        )
            .into_response(),
        Err(err) if err.is_client_error() => {
            if let SubmissionError::InvalidBody { detail } = &err {
                debug!(form = kind.label(), %detail, "rejected request body");
            }
            (
                StatusCode::BAD_REQUEST,
                Json(FormResponse::rejected(err.to_string())),
            )
                .into_response()
        }
        Err(err) => {
            error!(form = kind.label(), error = %err, "form submission failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(FormResponse::rejected(kind.failure_message())),
            )
                .into_response()
        }
    }
}

pub(crate) async fn method_not_allowed() -> Response {
    let mut response = (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "message": "Method not allowed" })),
    )
        .into_response();
    response
        .headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static("POST, OPTIONS"));
    response
}
