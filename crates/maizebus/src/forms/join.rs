use std::fmt::Write as _;

use crate::mail::{Envelope, MailMessage};

use super::html::{escape, is_web_link};
use super::resume::StoredResume;
use super::{SubmissionError, SubmissionFields};

/// Required join form fields, in the order they are reported when missing.
pub const JOIN_FIELDS: [&str; 5] = ["name", "email", "role", "experience", "motivation"];

/// A validated application to join the team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    pub name: String,
    pub email: String,
    pub role: String,
    pub experience: String,
    pub motivation: String,
    pub portfolio: Option<String>,
    pub other_clubs: Option<String>,
    pub relevant_classes: Option<String>,
    pub problem_solving: Option<String>,
}

impl Application {
    pub fn from_fields(fields: &SubmissionFields) -> Result<Self, SubmissionError> {
        fields.require(&JOIN_FIELDS)?;

        Ok(Self {
            name: fields.text("name"),
            email: fields.text("email"),
            role: fields.text("role"),
            experience: fields.text("experience"),
            motivation: fields.text("motivation"),
            portfolio: fields.optional("portfolio"),
            other_clubs: fields.optional("otherClubs"),
            relevant_classes: fields.optional("relevantClasses"),
            problem_solving: fields.optional("problemSolving"),
        })
    }

    pub fn subject_line(&self) -> String {
        format!("New MaizeBus Application - {} ({})", self.name, self.role)
    }

    pub fn render_html(&self, resume: Option<&StoredResume>) -> String {
        let mut extras = String::new();

        if let Some(portfolio) = &self.portfolio {
            let value = escape(portfolio);
            if is_web_link(portfolio) {
                let _ = write!(
                    extras,
                    "\n        <p><strong>Portfolio/GitHub:</strong> <a href=\"{value}\">{value}</a></p>"
                );
            } else {
                let _ = write!(
                    extras,
                    "\n        <p><strong>Portfolio/GitHub:</strong> {value}</p>"
                );
            }
        }
        for (label, value) in [
            ("Other Clubs", &self.other_clubs),
            ("Relevant Classes", &self.relevant_classes),
            ("Problem Solving", &self.problem_solving),
        ] {
            if let Some(value) = value {
                let _ = write!(
                    extras,
                    "\n        <p><strong>{label}:</strong> {}</p>",
                    escape(value)
                );
            }
        }
        if let Some(resume) = resume {
            let _ = write!(
                extras,
                "\n        <p><strong>Resume:</strong> {} (attached)</p>",
                escape(resume.attachment_name())
            );
        }

        format!(
            r#"
      <h2>New MaizeBus Application</h2>
      <div style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
        <h3>Personal Information</h3>
        <p><strong>Name:</strong> {name}</p>
        <p><strong>Email:</strong> {email}</p>
        <p><strong>Preferred Role:</strong> {role}</p>

        <h3>Application Details</h3>
        <p><strong>Experience & Skills:</strong></p>
        <p style="background: #f5f5f5; padding: 10px; border-radius: 5px; white-space: pre-wrap;">{experience}</p>

        <p><strong>Why MaizeBus:</strong></p>
        <p style="background: #f5f5f5; padding: 10px; border-radius: 5px; white-space: pre-wrap;">{motivation}</p>
{extras}
      </div>
    "#,
            name = escape(&self.name),
            email = escape(&self.email),
            role = escape(&self.role),
            experience = escape(&self.experience),
            motivation = escape(&self.motivation),
        )
    }

    pub fn to_message(&self, envelope: &Envelope, resume: Option<&StoredResume>) -> MailMessage {
        MailMessage {
            from: envelope.from.clone(),
            to: envelope.to.clone(),
            reply_to: super::reply_to(&self.email),
            subject: self.subject_line(),
            html: self.render_html(resume),
            attachments: resume.map(StoredResume::attachment).into_iter().collect(),
        }
    }
}
