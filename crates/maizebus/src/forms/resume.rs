//! Resume attachments for the join form.
//!
//! Uploads are checked against [`ResumePolicy`] before anything touches the disk.
//! Accepted files land in the uploads directory as
//! `{field}-{unix millis}-{random}{.ext}` and are never cleaned up by this service.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Utc;
use rand::Rng;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::config::UploadConfig;
use crate::mail::MailAttachment;

/// Multipart part name carrying the resume.
pub const RESUME_FIELD: &str = "resume";

/// PDF, legacy Word, and modern Word.
pub const ALLOWED_RESUME_TYPES: [&str; 3] = [
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResumeRejection {
    #[error("Only PDF and Word documents are allowed.")]
    UnsupportedType(String),
    #[error("File size too large. Maximum size is {}MB.", .limit / (1024 * 1024))]
    TooLarge { limit: usize },
}

/// Limits applied to resume uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumePolicy {
    max_bytes: usize,
}

impl ResumePolicy {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Declared content type, or one guessed from the file name when none was sent.
    pub fn resolve_content_type(declared: Option<&str>, file_name: &str) -> String {
        match declared.map(str::trim).filter(|value| !value.is_empty()) {
            Some(value) => value.to_string(),
            None => mime_guess::from_path(file_name)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
        }
    }

    pub fn check_type(&self, content_type: &str) -> Result<(), ResumeRejection> {
        let essence = content_type
            .parse::<mime::Mime>()
            .map(|parsed| parsed.essence_str().to_ascii_lowercase())
            .unwrap_or_default();

        if ALLOWED_RESUME_TYPES.contains(&essence.as_str()) {
            Ok(())
        } else {
            Err(ResumeRejection::UnsupportedType(content_type.to_string()))
        }
    }

    pub fn check_size(&self, len: usize) -> Result<(), ResumeRejection> {
        if len > self.max_bytes {
            Err(ResumeRejection::TooLarge {
                limit: self.max_bytes,
            })
        } else {
            Ok(())
        }
    }

    /// The only way to obtain a [`ResumeUpload`].
    pub fn accept(
        &self,
        field_name: &str,
        file_name: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<ResumeUpload, ResumeRejection> {
        self.check_type(content_type)?;
        self.check_size(data.len())?;

        Ok(ResumeUpload {
            field_name: field_name.to_string(),
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            data,
        })
    }
}

impl From<&UploadConfig> for ResumePolicy {
    fn from(config: &UploadConfig) -> Self {
        Self::new(config.max_bytes)
    }
}

/// A resume that passed [`ResumePolicy`] and has not been stored yet.
#[derive(Clone, PartialEq, Eq)]
pub struct ResumeUpload {
    field_name: String,
    file_name: String,
    content_type: String,
    data: Vec<u8>,
}

impl ResumeUpload {
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Extension of the client file name including the dot, if it is a plain one.
    fn extension(&self) -> String {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default()
    }
}

impl fmt::Debug for ResumeUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResumeUpload")
            .field("field_name", &self.field_name)
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// A resume written to the uploads directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredResume {
    pub path: PathBuf,
    pub upload: ResumeUpload,
}

impl StoredResume {
    /// Name shown to the recipient: the client's base file name, else the stored name.
    pub fn attachment_name(&self) -> &str {
        Path::new(self.upload.file_name())
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .or_else(|| self.path.file_name().and_then(|name| name.to_str()))
            .unwrap_or(RESUME_FIELD)
    }

    pub fn attachment(&self) -> MailAttachment {
        MailAttachment {
            filename: self.attachment_name().to_string(),
            content_type: self.upload.content_type.clone(),
            data: self.upload.data.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResumeStoreError {
    #[error("failed to store resume at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Writes accepted resumes under a fixed directory.
#[derive(Debug, Clone)]
pub struct ResumeStore {
    dir: PathBuf,
}

impl ResumeStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name_for(upload: &ResumeUpload, millis: i64, suffix: u32) -> String {
        let field: String = upload
            .field_name()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
            .collect();
        let field = if field.is_empty() {
            RESUME_FIELD.to_string()
        } else {
            field
        };
        format!("{field}-{millis}-{suffix}{}", upload.extension())
    }

    pub async fn persist(&self, upload: ResumeUpload) -> Result<StoredResume, ResumeStoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| ResumeStoreError::Io {
                path: self.dir.clone(),
                source,
            })?;

        loop {
            let suffix = rand::thread_rng().gen_range(0..1_000_000_000u32);
            let path = self
                .dir
                .join(Self::file_name_for(&upload, Utc::now().timestamp_millis(), suffix));

            let file = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;
            let mut file = match file {
                Ok(file) => file,
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(source) => return Err(ResumeStoreError::Io { path, source }),
            };

            if let Err(source) = write_or_discard(file, &path, &upload.data).await {
                return Err(ResumeStoreError::Io { path, source });
            }

            tracing::debug!(path = %path.display(), bytes = upload.len(), "stored resume");
            return Ok(StoredResume { path, upload });
        }
    }
}

/// Writes `data` through `sink`; on failure the truncated file at `path` is removed.
async fn write_or_discard<W>(mut sink: W, path: &Path, data: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        sink.write_all(data).await?;
        sink.flush().await
    }
    .await;

    if written.is_err() {
        drop(sink);
        if let Err(err) = tokio::fs::remove_file(path).await {
            tracing::warn!(path = %path.display(), error = %err, "failed to remove partial resume");
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;

    const PDF: &str = "application/pdf";

    fn policy() -> ResumePolicy {
        ResumePolicy::new(5 * 1024 * 1024)
    }

    fn scratch_dir(label: &str) -> PathBuf {
        let suffix: u32 = rand::thread_rng().gen();
        std::env::temp_dir().join(format!("maizebus-{label}-{suffix}"))
    }

    #[test]
    fn accepts_pdf_and_word_documents() {
        let policy = policy();
        for content_type in ALLOWED_RESUME_TYPES {
            assert!(policy.check_type(content_type).is_ok(), "{content_type}");
        }
        assert!(policy.check_type("application/pdf; name=cv.pdf").is_ok());
    }

    #[test]
    fn rejects_other_content_types() {
        let err = policy()
            .accept(RESUME_FIELD, "cv.png", "image/png", vec![1, 2, 3])
            .expect_err("png rejected");
        assert_eq!(err, ResumeRejection::UnsupportedType("image/png".to_string()));
        assert_eq!(err.to_string(), "Only PDF and Word documents are allowed.");
    }

    #[test]
    fn enforces_five_megabyte_ceiling() {
        let policy = policy();
        assert!(policy.check_size(5 * 1024 * 1024).is_ok());
        let err = policy
            .check_size(5 * 1024 * 1024 + 1)
            .expect_err("oversize rejected");
        assert_eq!(err.to_string(), "File size too large. Maximum size is 5MB.");
    }

    #[test]
    fn guesses_content_type_when_undeclared() {
        assert_eq!(ResumePolicy::resolve_content_type(None, "cv.pdf"), PDF);
        assert_eq!(
            ResumePolicy::resolve_content_type(Some("application/msword"), "cv.pdf"),
            "application/msword"
        );
        assert_eq!(
            ResumePolicy::resolve_content_type(None, "cv"),
            "application/octet-stream"
        );
    }

    #[test]
    fn stored_name_keeps_field_and_extension() {
        let upload = policy()
            .accept(RESUME_FIELD, "../../My CV.pdf", PDF, b"%PDF".to_vec())
            .expect("accepted");
        assert_eq!(
            ResumeStore::file_name_for(&upload, 1_760_000_000_000, 42),
            "resume-1760000000000-42.pdf"
        );
    }

    #[test]
    fn odd_extensions_are_dropped() {
        let upload = policy()
            .accept(RESUME_FIELD, "cv.p df", PDF, b"%PDF".to_vec())
            .expect("accepted");
        assert_eq!(ResumeStore::file_name_for(&upload, 1, 2), "resume-1-2");
    }

    #[tokio::test]
    async fn persist_writes_unique_files() {
        let dir = scratch_dir("persist");
        let store = ResumeStore::new(&dir);
        let upload = policy()
            .accept(RESUME_FIELD, "cv.pdf", PDF, b"%PDF-1.4".to_vec())
            .expect("accepted");

        let first = store.persist(upload.clone()).await.expect("first stored");
        let second = store.persist(upload).await.expect("second stored");

        assert_ne!(first.path, second.path);
        assert!(first.path.starts_with(&dir));
        let stored = tokio::fs::read(&first.path).await.expect("read back");
        assert_eq!(stored, b"%PDF-1.4");
        assert_eq!(first.attachment_name(), "cv.pdf");
        assert_eq!(first.attachment().content_type, PDF);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn failed_write_leaves_no_partial_file() {
        let dir = scratch_dir("partial");
        std::fs::create_dir_all(&dir).expect("scratch dir");
        let path = dir.join("resume-1-2.pdf");
        std::fs::write(&path, b"%PD").expect("partial file");

        let (sink, reader) = tokio::io::duplex(8);
        drop(reader);
        let err = write_or_discard(sink, &path, b"%PDF-1.4")
            .await
            .expect_err("closed pipe");

        assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe);
        assert!(!path.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
