use axum::body::Bytes;
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::{header, StatusCode};
use axum::Form;
use serde_json::Value;

use super::resume::{ResumePolicy, ResumeRejection, ResumeUpload, RESUME_FIELD};
use super::{SubmissionError, SubmissionFields};

/// Everything a form request carried.
#[derive(Debug, Default)]
pub struct Submission {
    pub fields: SubmissionFields,
    pub resume: Option<ResumeUpload>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    UrlEncoded,
    Multipart,
}

fn body_kind(request: &Request) -> BodyKind {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<mime::Mime>().ok());

    match content_type {
        Some(mime) if mime.type_() == mime::MULTIPART && mime.subtype() == mime::FORM_DATA => {
            BodyKind::Multipart
        }
        Some(mime)
            if mime.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str() =>
        {
            BodyKind::UrlEncoded
        }
        _ => BodyKind::Json,
    }
}

/// Reads a form body as JSON, urlencoded, or multipart, chosen by `Content-Type`.
///
/// File parts are only accepted when `resumes` is given, and only under the `resume`
/// name. A resume is checked against the policy while it streams in, so an oversized
/// or mistyped file is refused before it is ever stored.
pub async fn read_submission(
    request: Request,
    resumes: Option<&ResumePolicy>,
) -> Result<Submission, SubmissionError> {
    match body_kind(&request) {
        BodyKind::Multipart => read_multipart(request, resumes).await,
        BodyKind::UrlEncoded => {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(request, &())
                .await
                .map_err(|rejection| invalid(rejection.body_text()))?;
            Ok(Submission {
                fields: SubmissionFields::from_pairs(pairs),
                resume: None,
            })
        }
        BodyKind::Json => {
            let bytes = Bytes::from_request(request, &())
                .await
                .map_err(|rejection| invalid(rejection.body_text()))?;
            // No body at all reads as an empty form so the missing-field check reports it.
            if bytes.iter().all(u8::is_ascii_whitespace) {
                return Ok(Submission::default());
            }
            let document: Value =
                serde_json::from_slice(&bytes).map_err(|err| invalid(err.to_string()))?;
            Ok(Submission {
                fields: SubmissionFields::from_json(document)?,
                resume: None,
            })
        }
    }
}

async fn read_multipart(
    request: Request,
    resumes: Option<&ResumePolicy>,
) -> Result<Submission, SubmissionError> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|rejection| invalid(rejection.body_text()))?;

    let mut submission = Submission::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| multipart_error(err, resumes))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let Some(file_name) = field.file_name().map(str::to_string) else {
            let value = field
                .text()
                .await
                .map_err(|err| multipart_error(err, resumes))?;
            submission.fields.insert(name, value);
            continue;
        };

        let Some(policy) = resumes.filter(|_| name == RESUME_FIELD) else {
            return Err(invalid(format!("unexpected file field '{name}'")));
        };
        if submission.resume.is_some() {
            return Err(invalid("more than one resume attached"));
        }
        submission.resume = read_resume(field, &name, &file_name, policy).await?;
    }

    Ok(submission)
}

async fn read_resume(
    mut field: Field<'_>,
    name: &str,
    file_name: &str,
    policy: &ResumePolicy,
) -> Result<Option<ResumeUpload>, SubmissionError> {
    let declared = field.content_type().map(str::to_string);
    let content_type = ResumePolicy::resolve_content_type(declared.as_deref(), file_name);

    // Browsers send an unnamed, empty part for an untouched file input.
    let blank = file_name.is_empty();
    if !blank {
        policy.check_type(&content_type)?;
    }

    let mut data = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|err| multipart_error(err, Some(policy)))?
    {
        policy.check_size(data.len() + chunk.len())?;
        data.extend_from_slice(&chunk);
    }

    if blank && data.is_empty() {
        return Ok(None);
    }

    Ok(Some(policy.accept(name, file_name, &content_type, data)?))
}

fn multipart_error(err: MultipartError, resumes: Option<&ResumePolicy>) -> SubmissionError {
    match resumes {
        Some(policy) if err.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            SubmissionError::Resume(ResumeRejection::TooLarge {
                limit: policy.max_bytes(),
            })
        }
        _ => invalid(err.body_text()),
    }
}

fn invalid(detail: impl Into<String>) -> SubmissionError {
    SubmissionError::InvalidBody {
        detail: detail.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(content_type: Option<&str>, body: impl Into<Body>) -> Request {
        let mut builder = Request::post("/api/join");
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        builder.body(body.into()).expect("request builds")
    }

    #[test]
    fn detects_body_kinds() {
        assert_eq!(body_kind(&request(None, "")), BodyKind::Json);
        assert_eq!(
            body_kind(&request(Some("application/json; charset=utf-8"), "")),
            BodyKind::Json
        );
        assert_eq!(
            body_kind(&request(Some("application/x-www-form-urlencoded"), "")),
            BodyKind::UrlEncoded
        );
        assert_eq!(
            body_kind(&request(Some("multipart/form-data; boundary=X"), "")),
            BodyKind::Multipart
        );
    }

    #[tokio::test]
    async fn empty_body_reads_as_empty_form() {
        let submission = read_submission(request(None, ""), None)
            .await
            .expect("empty body accepted");
        assert!(submission.fields.is_empty());
        assert!(submission.resume.is_none());
    }

    #[tokio::test]
    async fn malformed_json_is_invalid() {
        let err = read_submission(request(Some("application/json"), "{name:"), None)
            .await
            .expect_err("malformed json");
        assert!(matches!(err, SubmissionError::InvalidBody { .. }));
        assert_eq!(err.to_string(), "Invalid request body");
    }

    #[tokio::test]
    async fn urlencoded_pairs_become_fields() {
        let submission = read_submission(
            request(
                Some("application/x-www-form-urlencoded"),
                "name=Test+User&email=test%40umich.edu&subject=",
            ),
            None,
        )
        .await
        .expect("form accepted");
        assert_eq!(submission.fields.get("name"), Some("Test User"));
        assert_eq!(submission.fields.get("email"), Some("test@umich.edu"));
        assert_eq!(submission.fields.get("subject"), None);
    }
}
