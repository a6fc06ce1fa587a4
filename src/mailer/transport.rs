//! Transport seam: one configured connection per dispatch call.
//!
//! [`Connector`] turns a [`MailerConfig`] into a [`Gateway`]; the gateway
//! verifies reachability once and then sends one message per recipient.
//! The SMTP implementation lives in [`crate::mailer::smtp`]; tests plug in
//! the scripted fakes from `test_support`.

use std::sync::Arc;

use crate::mailer::config::MailerConfig;
use crate::mailer::error::{MailerError, TransportError};
use crate::recipients::EmailAddress;

/// The compose-once message shared by every recipient of a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

impl OutgoingMessage {
    pub fn compose(subject: &str, body: &str) -> Self {
        Self {
            subject: subject.to_string(),
            text_body: body.to_string(),
            html_body: html_from_plain(body),
        }
    }
}

/// HTML rendition of a plain-text body: line breaks become `<br>`.
pub fn html_from_plain(body: &str) -> String {
    body.replace("\r\n", "<br>").replace('\n', "<br>")
}

/// One recipient paired with the shared message.
#[derive(Debug, Clone)]
pub struct DispatchTask {
    /// Index of the recipient in the dispatch's address set.
    pub position: usize,
    pub recipient: EmailAddress,
    pub message: Arc<OutgoingMessage>,
}

/// An authenticated outbound connection.
#[rocket::async_trait]
pub trait Gateway: Send + Sync {
    /// Handshake with the server before any recipient is attempted.
    async fn verify_reachable(&self) -> Result<(), TransportError>;

    /// Deliver the task's message to exactly one recipient.
    async fn send_one(&self, task: &DispatchTask) -> Result<(), TransportError>;
}

/// Builds a [`Gateway`] from configuration.
pub trait Connector: Send + Sync {
    /// Fails with [`MailerError::MisconfiguredCredentials`] when the sender
    /// identity or secret is missing.
    fn configure(&self, config: &MailerConfig) -> Result<Arc<dyn Gateway>, MailerError>;
}
