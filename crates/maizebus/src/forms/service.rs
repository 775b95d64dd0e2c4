use chrono::Local;
use tracing::info;

use crate::config::UploadConfig;
use crate::mail::{Delivery, MailDispatcher};

use super::contact::Inquiry;
use super::html::timestamp;
use super::join::Application;
use super::resume::{ResumePolicy, ResumeStore, ResumeUpload};
use super::{SubmissionError, SubmissionFields};

/// Service composing validation, resume storage, and the mail dispatcher.
#[derive(Debug, Clone)]
pub struct FormRelayService {
    dispatcher: MailDispatcher,
    resumes: ResumePolicy,
    store: ResumeStore,
}

impl FormRelayService {
    pub fn new(dispatcher: MailDispatcher, uploads: &UploadConfig) -> Self {
        Self {
            dispatcher,
            resumes: ResumePolicy::from(uploads),
            store: ResumeStore::new(uploads.dir.clone()),
        }
    }

    pub fn dispatcher(&self) -> &MailDispatcher {
        &self.dispatcher
    }

    pub fn resume_policy(&self) -> &ResumePolicy {
        &self.resumes
    }

    pub fn resume_store(&self) -> &ResumeStore {
        &self.store
    }

    /// Relay a contact form submission to the team inbox.
    pub async fn submit_contact(
        &self,
        fields: &SubmissionFields,
    ) -> Result<Delivery, SubmissionError> {
        let inquiry = Inquiry::from_fields(fields)?;
        let submitted_at = timestamp(&Local::now());

        let delivery = self
            .dispatcher
            .dispatch(|envelope| inquiry.to_message(envelope, &submitted_at))
            .await?;

        if delivery == Delivery::NotConfigured {
            info!(
                name = %inquiry.name,
                email = %inquiry.email,
                inquiry_type = %inquiry.inquiry_type.label(),
                subject = %inquiry.subject,
                message = %inquiry.message,
                "contact form submission (email not configured)"
            );
        }

        Ok(delivery)
    }

    /// Relay a join application, storing the resume first when one was uploaded.
    ///
    /// Required fields are checked before the resume is written, so an incomplete
    /// application never leaves a file behind.
    pub async fn submit_application(
        &self,
        fields: &SubmissionFields,
        resume: Option<ResumeUpload>,
    ) -> Result<Delivery, SubmissionError> {
        let application = Application::from_fields(fields)?;

        let stored = match resume {
            Some(upload) => Some(self.store.persist(upload).await?),
            None => None,
        };

        let delivery = self
            .dispatcher
            .dispatch(|envelope| application.to_message(envelope, stored.as_ref()))
            .await?;

        if delivery == Delivery::NotConfigured {
            let resume_path = stored
                .as_ref()
                .map(|resume| resume.path.display().to_string())
                .unwrap_or_else(|| "none".to_string());
            info!(
                name = %application.name,
                email = %application.email,
                role = %application.role,
                experience = %application.experience,
                motivation = %application.motivation,
                resume = %resume_path,
                "join application (email not configured)"
            );
        }

        Ok(delivery)
    }
}
