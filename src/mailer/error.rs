use rocket::http::Status;
use thiserror::Error;

/// Call-level dispatch failures. Each one stops the call before any send.
#[derive(Debug, Error)]
pub enum MailerError {
    #[error("Missing required fields: emails, subject, and message are required")]
    MissingFields,
    #[error("No valid email addresses provided")]
    NoRecipients,
    #[error("Invalid email addresses: {}", .0.join(", "))]
    InvalidAddresses(Vec<String>),
    #[error("Server configuration error: SMTP credentials not configured (missing {})", .0.join(", "))]
    MisconfiguredCredentials(Vec<&'static str>),
    #[error("Server configuration error: SMTP_EMAIL '{address}' is not a valid sender address ({reason})")]
    MisconfiguredSender { address: String, reason: String },
    #[error("Email server configuration error. Please check your SMTP settings.")]
    TransportUnavailable { detail: String },
}

impl MailerError {
    pub fn unavailable(detail: impl ToString) -> Self {
        MailerError::TransportUnavailable {
            detail: detail.to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MailerError::MissingFields => "MissingFields",
            MailerError::NoRecipients => "NoRecipients",
            MailerError::InvalidAddresses(_) => "InvalidAddresses",
            MailerError::MisconfiguredCredentials(_) => "MisconfiguredCredentials",
            MailerError::MisconfiguredSender { .. } => "MisconfiguredSender",
            MailerError::TransportUnavailable { .. } => "TransportUnavailable",
        }
    }

    pub fn status(&self) -> Status {
        match self {
            MailerError::MissingFields
            | MailerError::NoRecipients
            | MailerError::InvalidAddresses(_) => Status::BadRequest,
            MailerError::MisconfiguredCredentials(_)
            | MailerError::MisconfiguredSender { .. }
            | MailerError::TransportUnavailable { .. } => Status::InternalServerError,
        }
    }
}

/// Errors from the outbound connection. During a send these are scoped to a
/// single recipient and end up as the outcome's error detail.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid sender address '{address}': {reason}")]
    Sender { address: String, reason: String },
    #[error("invalid recipient address '{address}': {reason}")]
    Recipient { address: String, reason: String },
    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("SMTP server did not accept the connection check")]
    Unreachable,
    #[error("{0}")]
    Rejected(String),
}
