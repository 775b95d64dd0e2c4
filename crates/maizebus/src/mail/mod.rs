//! Outbound mail: the message model, the `Mailer` seam, and the process-wide dispatcher.
//!
//! The dispatcher is decided once at startup. Without SMTP credentials it stays
//! `Unconfigured` for the life of the process and callers fall back to logging.

mod smtp;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::MailConfig;

pub use smtp::SmtpMailer;

/// A fully composed notification ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub html: String,
    pub attachments: Vec<MailAttachment>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct MailAttachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl fmt::Debug for MailAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailAttachment")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Sender and recipient fixed by configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub from: String,
    pub to: String,
}

/// Transport abstraction so handlers can be exercised without an SMTP relay.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid mailbox '{0}'")]
    InvalidAddress(String),
    #[error("invalid attachment content type '{0}'")]
    InvalidContentType(String),
    #[error("failed to build message: {0}")]
    Build(String),
    #[error("smtp transport error: {0}")]
    Transport(String),
}

/// What happened to a composed notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    NotConfigured,
}

/// Handle shared read-only by every request.
#[derive(Clone)]
pub enum MailDispatcher {
    Configured {
        mailer: Arc<dyn Mailer>,
        envelope: Envelope,
    },
    Unconfigured,
}

impl MailDispatcher {
    pub fn configured(mailer: Arc<dyn Mailer>, envelope: Envelope) -> Self {
        Self::Configured { mailer, envelope }
    }

    /// Builds an SMTP-backed dispatcher when credentials are present.
    pub fn from_config(config: &MailConfig) -> Result<Self, MailError> {
        let Some(credentials) = &config.credentials else {
            warn!("email not configured; form submissions will be logged only");
            warn!("set EMAIL_USER and EMAIL_PASS to enable email delivery");
            return Ok(Self::Unconfigured);
        };

        let mailer = SmtpMailer::new(config, credentials)?;
        info!(
            host = %config.host,
            port = config.port,
            security = %config.security,
            recipient = %config.recipient,
            "smtp dispatcher configured"
        );

        Ok(Self::configured(
            Arc::new(mailer),
            Envelope {
                from: credentials.username.clone(),
                to: config.recipient.clone(),
            },
        ))
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, Self::Configured { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Configured { .. } => "configured",
            Self::Unconfigured => "unconfigured",
        }
    }

    /// Composes and sends a message when a transport exists. `compose` is not called
    /// for an unconfigured dispatcher.
    pub async fn dispatch<F>(&self, compose: F) -> Result<Delivery, MailError>
    where
        F: FnOnce(&Envelope) -> MailMessage,
    {
        match self {
            Self::Configured { mailer, envelope } => {
                let message = compose(envelope);
                mailer.send(&message).await?;
                Ok(Delivery::Sent)
            }
            Self::Unconfigured => Ok(Delivery::NotConfigured),
        }
    }
}

impl fmt::Debug for MailDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configured { envelope, .. } => f
                .debug_struct("Configured")
                .field("envelope", envelope)
                .finish_non_exhaustive(),
            Self::Unconfigured => f.write_str("Unconfigured"),
        }
    }
}
