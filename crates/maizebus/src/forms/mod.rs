//! Contact and join form intake.
//!
//! Each form checks its required fields by name, renders an escaped HTML notification,
//! and hands it to the [`MailDispatcher`](crate::mail::MailDispatcher). When no mail
//! transport is configured the submission is written to the log instead and the caller
//! still sees success.

pub mod body;
pub mod contact;
pub(crate) mod fields;
pub mod html;
pub mod join;
pub mod resume;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

use lettre::message::Mailbox;
use serde::{Deserialize, Serialize};

use crate::mail::MailError;

pub use body::{read_submission, Submission};
pub use contact::{Inquiry, InquiryType, CONTACT_FIELDS};
pub use fields::SubmissionFields;
pub use join::{Application, JOIN_FIELDS};
pub use resume::{
    ResumePolicy, ResumeRejection, ResumeStore, ResumeStoreError, ResumeUpload, StoredResume,
};
pub use router::form_router;
pub use service::FormRelayService;

/// Why a submission did not produce a notification.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("Invalid request body")]
    InvalidBody { detail: String },
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),
    #[error(transparent)]
    Resume(#[from] ResumeRejection),
    #[error(transparent)]
    Storage(#[from] ResumeStoreError),
    #[error(transparent)]
    Mail(#[from] MailError),
}

impl SubmissionError {
    /// Errors the submitter can fix by resubmitting different input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidBody { .. } | Self::MissingFields(_) | Self::Resume(_)
        )
    }
}

/// Which form a request belongs to; selects the user-facing wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Contact,
    Join,
}

impl FormKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Contact => "contact",
            Self::Join => "join",
        }
    }

    pub fn sent_message(self) -> &'static str {
        match self {
            Self::Contact => "Message sent successfully! We'll get back to you soon.",
            Self::Join => "Application submitted successfully! We'll be in touch soon.",
        }
    }

    pub fn logged_message(self) -> &'static str {
        match self {
            Self::Contact => "Message received (email not configured).",
            Self::Join => "Application received (email not configured).",
        }
    }

    pub fn failure_message(self) -> &'static str {
        match self {
            Self::Contact => "Failed to send message. Please try again later.",
            Self::Join => "Failed to submit application. Please try again later.",
        }
    }
}

/// JSON body returned by both form endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormResponse {
    pub success: bool,
    pub message: String,
}

impl FormResponse {
    pub fn accepted(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Submitter address usable as `Reply-To`, if it parses as a single mailbox.
pub(crate) fn reply_to(email: &str) -> Option<String> {
    email
        .trim()
        .parse::<Mailbox>()
        .ok()
        .map(|mailbox| mailbox.email.to_string())
}
