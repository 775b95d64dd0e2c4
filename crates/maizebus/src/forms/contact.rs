use crate::mail::{Envelope, MailMessage};

use super::html::escape;
use super::{SubmissionError, SubmissionFields};

/// Required contact form fields, in the order they are reported when missing.
pub const CONTACT_FIELDS: [&str; 5] = ["name", "email", "inquiryType", "subject", "message"];

/// Category picked on the contact form. Unknown values are carried through as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InquiryType {
    General,
    Bug,
    Feature,
    Other(String),
}

impl InquiryType {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "general" => Self::General,
            "bug" => Self::Bug,
            "feature" => Self::Feature,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::General => "General Inquiry",
            Self::Bug => "Bug Report",
            Self::Feature => "Feature Request",
            Self::Other(raw) => raw,
        }
    }
}

/// A validated contact form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inquiry {
    pub name: String,
    pub email: String,
    pub inquiry_type: InquiryType,
    pub subject: String,
    pub message: String,
}

impl Inquiry {
    pub fn from_fields(fields: &SubmissionFields) -> Result<Self, SubmissionError> {
        fields.require(&CONTACT_FIELDS)?;

        Ok(Self {
            name: fields.text("name"),
            email: fields.text("email"),
            inquiry_type: InquiryType::parse(&fields.text("inquiryType")),
            subject: fields.text("subject"),
            message: fields.text("message"),
        })
    }

    pub fn subject_line(&self) -> String {
        format!("Contact Form: {} - {}", self.subject, self.name)
    }

    pub fn render_html(&self, submitted_at: &str) -> String {
        format!(
            r#"
      <h2>New Contact Form Submission</h2>
      <div style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
        <h3>Contact Information</h3>
        <p><strong>Name:</strong> {name}</p>
        <p><strong>Email:</strong> {email}</p>
        <p><strong>Inquiry Type:</strong> {inquiry_type}</p>
        <p><strong>Subject:</strong> {subject}</p>

        <h3>Message</h3>
        <p style="background: #f5f5f5; padding: 15px; border-radius: 8px; white-space: pre-wrap; border-left: 4px solid #FFCB05;">{message}</p>

        <hr style="margin: 20px 0; border: none; border-top: 1px solid #e2e8f0;">
        <p style="font-size: 0.875rem; color: #64748b;">
          This message was sent through the MaizeBus contact form on {submitted_at}.
        </p>
      </div>
    "#,
            name = escape(&self.name),
            email = escape(&self.email),
            inquiry_type = escape(self.inquiry_type.label()),
            subject = escape(&self.subject),
            message = escape(&self.message),
            submitted_at = escape(submitted_at),
        )
    }

    pub fn to_message(&self, envelope: &Envelope, submitted_at: &str) -> MailMessage {
        MailMessage {
            from: envelope.from.clone(),
            to: envelope.to.clone(),
            reply_to: super::reply_to(&self.email),
            subject: self.subject_line(),
            html: self.render_html(submitted_at),
            attachments: Vec::new(),
        }
    }
}
