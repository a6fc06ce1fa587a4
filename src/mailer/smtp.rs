//! SMTP gateway backed by lettre's async STARTTLS transport.

use std::sync::Arc;

use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::mailer::config::{MailerConfig, SenderCredentials};
use crate::mailer::error::{MailerError, TransportError};
use crate::mailer::transport::{Connector, DispatchTask, Gateway};

/// Connector producing [`SmtpGateway`]s from the injected configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmtpConnector;

impl Connector for SmtpConnector {
    fn configure(&self, config: &MailerConfig) -> Result<Arc<dyn Gateway>, MailerError> {
        let credentials = config.credentials()?;
        let gateway =
            SmtpGateway::connect(config, &credentials).map_err(|err| match err {
                TransportError::Sender { address, reason } => {
                    MailerError::MisconfiguredSender { address, reason }
                }
                other => {
                    log::error!("failed to configure SMTP transport: {}", other);
                    MailerError::unavailable(other)
                }
            })?;
        Ok(Arc::new(gateway))
    }
}

#[derive(Clone)]
pub struct SmtpGateway {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpGateway {
    pub fn connect(
        config: &MailerConfig,
        credentials: &SenderCredentials,
    ) -> Result<Self, TransportError> {
        let sender = sender_mailbox(&credentials.sender_email, config.sender_name.as_deref())?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                credentials.sender_email.clone(),
                credentials.secret.clone(),
            ))
            .timeout(Some(config.command_timeout))
            .build();

        log::debug!(
            "configured SMTP relay {}:{} for {}",
            config.smtp_host,
            config.smtp_port,
            sender
        );

        Ok(Self { transport, sender })
    }

    fn build_message(&self, task: &DispatchTask) -> Result<Message, TransportError> {
        let address: Address =
            task.recipient
                .as_str()
                .parse()
                .map_err(|err: lettre::address::AddressError| TransportError::Recipient {
                    address: task.recipient.to_string(),
                    reason: err.to_string(),
                })?;

        let message = Message::builder()
            .from(self.sender.clone())
            .to(Mailbox::new(None, address))
            .subject(task.message.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                task.message.text_body.clone(),
                task.message.html_body.clone(),
            ))?;

        Ok(message)
    }
}

fn sender_mailbox(sender_email: &str, sender_name: Option<&str>) -> Result<Mailbox, TransportError> {
    let address: Address = sender_email
        .parse()
        .map_err(|err: lettre::address::AddressError| TransportError::Sender {
            address: sender_email.to_string(),
            reason: err.to_string(),
        })?;

    Ok(Mailbox::new(sender_name.map(str::to_string), address))
}

#[rocket::async_trait]
impl Gateway for SmtpGateway {
    async fn verify_reachable(&self) -> Result<(), TransportError> {
        if self.transport.test_connection().await? {
            Ok(())
        } else {
            Err(TransportError::Unreachable)
        }
    }

    async fn send_one(&self, task: &DispatchTask) -> Result<(), TransportError> {
        let message = self.build_message(task)?;
        self.transport.send(message).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailer::transport::OutgoingMessage;
    use crate::recipients::EmailAddress;

    fn gateway(sender_name: Option<&str>) -> SmtpGateway {
        let mut config = MailerConfig::for_sender("sender@example.com", "app-password");
        config.sender_name = sender_name.map(str::to_string);
        let credentials = config.credentials().unwrap();
        SmtpGateway::connect(&config, &credentials).unwrap()
    }

    #[test]
    fn test_sender_mailbox_with_display_name() {
        let mailbox = sender_mailbox("sender@example.com", Some("Campaigns")).unwrap();
        assert_eq!(mailbox.email.to_string(), "sender@example.com");
        assert_eq!(mailbox.name.as_deref(), Some("Campaigns"));
    }

    #[test]
    fn test_invalid_sender_is_rejected() {
        assert!(matches!(
            sender_mailbox("not an address", None),
            Err(TransportError::Sender { .. })
        ));
    }

    #[tokio::test]
    async fn test_build_message_is_multipart_alternative() {
        let gateway = gateway(Some("Campaigns"));
        let task = DispatchTask {
            position: 0,
            recipient: EmailAddress::parse("jane@example.com").unwrap(),
            message: Arc::new(OutgoingMessage::compose("Hello", "Line one\nLine two")),
        };

        let message = gateway.build_message(&task).unwrap();
        let rendered = String::from_utf8(message.formatted()).unwrap();
        assert!(rendered.contains("To: jane@example.com"));
        assert!(rendered.contains("Subject: Hello"));
        assert!(rendered.contains("multipart/alternative"));
        assert!(rendered.contains("Line one<br>Line two"));
    }

    #[tokio::test]
    async fn test_malformed_sender_is_not_a_reachability_failure() {
        let result = SmtpConnector.configure(&MailerConfig::for_sender("not an address", "pw"));
        assert!(matches!(
            result,
            Err(MailerError::MisconfiguredSender { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_before_connecting() {
        let result = SmtpConnector.configure(&MailerConfig::unconfigured());
        assert!(matches!(
            result,
            Err(MailerError::MisconfiguredCredentials(_))
        ));
    }
}
