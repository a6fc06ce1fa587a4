use lettre::Address;
use std::fmt;
use std::time::Duration;

use crate::config::{env_duration_millis, env_optional, env_string, env_u16};
use crate::mailer::error::MailerError;

pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_TIMEOUT_MILLIS: u64 = 30_000;

pub const SENDER_EMAIL_VAR: &str = "SMTP_EMAIL";
pub const SENDER_PASSWORD_VAR: &str = "SMTP_PASSWORD";

/// Outbound mail settings, resolved once and injected into the dispatcher.
///
/// Credentials are optional here so the server can start without them;
/// their absence surfaces per dispatch call through [`MailerConfig::credentials`].
#[derive(Clone)]
pub struct MailerConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub sender_email: Option<String>,
    pub sender_name: Option<String>,
    pub sender_password: Option<String>,
    pub command_timeout: Duration,
}

/// Sender identity and secret, both present and non-blank.
#[derive(Clone)]
pub struct SenderCredentials {
    pub sender_email: String,
    pub secret: String,
}

impl MailerConfig {
    pub fn from_env() -> Self {
        Self {
            smtp_host: env_string("SMTP_HOST", DEFAULT_SMTP_HOST),
            smtp_port: env_u16("SMTP_PORT", DEFAULT_SMTP_PORT),
            sender_email: env_optional(SENDER_EMAIL_VAR),
            sender_name: env_optional("SMTP_SENDER_NAME"),
            sender_password: env_optional(SENDER_PASSWORD_VAR),
            command_timeout: env_duration_millis("SMTP_TIMEOUT_MS", DEFAULT_TIMEOUT_MILLIS),
        }
    }

    /// Default relay settings with explicit credentials.
    pub fn for_sender(sender_email: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            sender_email: Some(sender_email.into()),
            sender_password: Some(secret.into()),
            ..Self::unconfigured()
        }
    }

    /// Default relay settings with no credentials.
    pub fn unconfigured() -> Self {
        Self {
            smtp_host: DEFAULT_SMTP_HOST.to_string(),
            smtp_port: DEFAULT_SMTP_PORT,
            sender_email: None,
            sender_name: None,
            sender_password: None,
            command_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MILLIS),
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials().is_ok()
    }

    /// Resolve the sender credentials, naming every missing variable. A
    /// sender identity that is not a mailbox address is rejected here too.
    pub fn credentials(&self) -> Result<SenderCredentials, MailerError> {
        let sender_email = non_blank(self.sender_email.as_deref());
        let secret = non_blank(self.sender_password.as_deref());

        match (sender_email, secret) {
            (Some(sender_email), Some(secret)) => {
                sender_email.parse::<Address>().map_err(|err| {
                    MailerError::MisconfiguredSender {
                        address: sender_email.to_string(),
                        reason: err.to_string(),
                    }
                })?;
                Ok(SenderCredentials {
                    sender_email: sender_email.to_string(),
                    secret: secret.to_string(),
                })
            }
            (sender_email, secret) => {
                let mut missing = Vec::new();
                if sender_email.is_none() {
                    missing.push(SENDER_EMAIL_VAR);
                }
                if secret.is_none() {
                    missing.push(SENDER_PASSWORD_VAR);
                }
                Err(MailerError::MisconfiguredCredentials(missing))
            }
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

impl fmt::Debug for MailerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailerConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("sender_email", &self.sender_email)
            .field("sender_name", &self.sender_name)
            .field(
                "sender_password",
                &self.sender_password.as_ref().map(|_| "<redacted>"),
            )
            .field("command_timeout", &self.command_timeout)
            .finish()
    }
}

impl fmt::Debug for SenderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SenderCredentials")
            .field("sender_email", &self.sender_email)
            .field("secret", &"<redacted>")
            .finish()
    }
}
