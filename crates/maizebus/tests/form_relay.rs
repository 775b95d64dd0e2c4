use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use maizebus::config::{UploadConfig, MAX_RESUME_BYTES};
use maizebus::forms::{form_router, FormRelayService, FormResponse};
use maizebus::mail::{Envelope, MailDispatcher, MailError, MailMessage, Mailer};
use serde_json::{json, Value};
use tower::ServiceExt;

#[derive(Default)]
struct Outbox {
    messages: Mutex<Vec<MailMessage>>,
}

#[async_trait]
impl Mailer for Outbox {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        self.messages
            .lock()
            .expect("outbox mutex poisoned")
            .push(message.clone());
        Ok(())
    }
}

fn uploads() -> UploadConfig {
    UploadConfig {
        dir: std::env::temp_dir().join("maizebus-form-relay-it"),
        max_bytes: MAX_RESUME_BYTES,
    }
}

fn router(dispatcher: MailDispatcher) -> Router {
    form_router(Arc::new(FormRelayService::new(dispatcher, &uploads())))
}

async fn post_json(router: Router, path: &str, payload: Value) -> (StatusCode, FormResponse) {
    let response = router
        .oneshot(
            Request::post(path)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 16 * 1024)
        .await
        .expect("body to bytes");
    (status, serde_json::from_slice(&body).expect("form response"))
}

#[tokio::test]
async fn contact_submission_without_mail_is_acknowledged() {
    let (status, body) = post_json(
        router(MailDispatcher::Unconfigured),
        "/api/contact",
        json!({
            "name": "Test User",
            "email": "test@umich.edu",
            "inquiryType": "general",
            "subject": "Test",
            "message": "Hello",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        FormResponse::accepted("Message received (email not configured).")
    );
}

#[tokio::test]
async fn join_submission_missing_motivation_is_rejected() {
    let (status, body) = post_json(
        router(MailDispatcher::Unconfigured),
        "/api/join",
        json!({
            "name": "Test User",
            "email": "test@umich.edu",
            "role": "Frontend Developer",
            "experience": "React, TypeScript, Node.js",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        FormResponse::rejected("Missing required fields: motivation")
    );
}

#[tokio::test]
async fn falsy_json_values_count_as_missing() {
    let (status, body) = post_json(
        router(MailDispatcher::Unconfigured),
        "/api/contact",
        json!({
            "name": "Test User",
            "email": "test@umich.edu",
            "inquiryType": false,
            "subject": 0,
            "message": null,
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body.message,
        "Missing required fields: inquiryType, subject, message"
    );
}

#[tokio::test]
async fn configured_relay_escapes_and_labels_the_notification() {
    let outbox = Arc::new(Outbox::default());
    let dispatcher = MailDispatcher::configured(
        outbox.clone(),
        Envelope {
            from: "team@maizebus.com".to_string(),
            to: "contact@maizebus.com".to_string(),
        },
    );

    let (status, body) = post_json(
        router(dispatcher),
        "/api/contact",
        json!({
            "name": "<Eve>",
            "email": "eve@umich.edu",
            "inquiryType": "partnership",
            "subject": "Hi & bye",
            "message": "<script>alert(1)</script>",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.success);

    let messages = outbox.messages.lock().expect("outbox mutex poisoned");
    assert_eq!(messages.len(), 1);
    let html = &messages[0].html;
    assert!(html.contains("&lt;Eve&gt;"));
    assert!(html.contains("Hi &amp; bye"));
    assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    assert!(html.contains("<strong>Inquiry Type:</strong> partnership"));
    assert!(!html.contains("<script>"));
    assert_eq!(messages[0].subject, "Contact Form: Hi & bye - <Eve>");
}
