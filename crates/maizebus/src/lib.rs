//! MaizeBus website backend: contact and join form relay.
//!
//! Submissions are validated, rendered as HTML notifications, and delivered over SMTP
//! when credentials are configured. Without credentials the service keeps answering
//! successfully and writes each submission to the log instead.

pub mod config;
pub mod error;
pub mod forms;
pub mod mail;
pub mod telemetry;
