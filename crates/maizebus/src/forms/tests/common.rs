use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use rand::Rng;
use serde_json::{json, Value};

use crate::config::{UploadConfig, MAX_RESUME_BYTES};
use crate::forms::FormRelayService;
use crate::mail::{Envelope, MailDispatcher, MailError, MailMessage, Mailer};

pub(super) const BOUNDARY: &str = "maizebus-test-boundary";
pub(super) const PDF: &str = "application/pdf";

#[derive(Default)]
pub(super) struct RecordingMailer {
    sent: Mutex<Vec<MailMessage>>,
}

impl RecordingMailer {
    pub(super) fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().expect("mailer mutex poisoned").clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        self.sent
            .lock()
            .expect("mailer mutex poisoned")
            .push(message.clone());
        Ok(())
    }
}

pub(super) struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _message: &MailMessage) -> Result<(), MailError> {
        Err(MailError::Transport("connection refused".to_string()))
    }
}

pub(super) fn envelope() -> Envelope {
    Envelope {
        from: "team@maizebus.com".to_string(),
        to: "contact@maizebus.com".to_string(),
    }
}

pub(super) fn scratch_dir(label: &str) -> PathBuf {
    let suffix: u32 = rand::thread_rng().gen();
    std::env::temp_dir().join(format!("maizebus-forms-{label}-{suffix}"))
}

pub(super) fn uploads(dir: &Path) -> UploadConfig {
    UploadConfig {
        dir: dir.to_path_buf(),
        max_bytes: MAX_RESUME_BYTES,
    }
}

pub(super) fn recording_service(dir: &Path) -> (FormRelayService, Arc<RecordingMailer>) {
    let mailer = Arc::new(RecordingMailer::default());
    let dispatcher = MailDispatcher::configured(mailer.clone(), envelope());
    (FormRelayService::new(dispatcher, &uploads(dir)), mailer)
}

pub(super) fn failing_service(dir: &Path) -> FormRelayService {
    let dispatcher = MailDispatcher::configured(Arc::new(FailingMailer), envelope());
    FormRelayService::new(dispatcher, &uploads(dir))
}

pub(super) fn logging_service(dir: &Path) -> FormRelayService {
    FormRelayService::new(MailDispatcher::Unconfigured, &uploads(dir))
}

pub(super) fn contact_payload() -> Value {
    json!({
        "name": "Test User",
        "email": "test@umich.edu",
        "inquiryType": "general",
        "subject": "Test",
        "message": "Hello",
    })
}

pub(super) fn join_pairs() -> Vec<(&'static str, &'static str)> {
    vec![
        ("name", "Test User"),
        ("email", "test@umich.edu"),
        ("role", "Frontend Developer"),
        ("experience", "React, TypeScript, Node.js"),
        (
            "motivation",
            "I want to help build transportation solutions for students",
        ),
    ]
}

pub(super) fn json_request(path: &str, payload: &Value) -> Request<Body> {
    Request::post(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request builds")
}

pub(super) enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: Option<&'a str>,
        data: &'a [u8],
    },
}

pub(super) fn multipart_request(path: &str, parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            Part::File {
                name,
                file_name,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n"
                    )
                    .as_bytes(),
                );
                if let Some(content_type) = content_type {
                    body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
                }
                body.extend_from_slice(b"\r\n");
                body.extend_from_slice(data);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::post(path)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request builds")
}

pub(super) fn join_parts<'a>(resume: Option<Part<'a>>) -> Vec<Part<'a>> {
    let mut parts: Vec<Part<'a>> = join_pairs()
        .into_iter()
        .map(|(name, value)| Part::Text(name, value))
        .collect();
    parts.extend(resume);
    parts
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body to bytes");
    serde_json::from_slice(&body).expect("valid json")
}

pub(super) fn files_in(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .collect(),
        Err(_) => Vec::new(),
    }
}

pub(super) fn cleanup(dir: &Path) {
    let _ = std::fs::remove_dir_all(dir);
}
