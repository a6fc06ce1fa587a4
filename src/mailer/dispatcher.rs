//! Bulk dispatch: validate once, verify once, then send to every recipient
//! concurrently and report each outcome.

use std::sync::Arc;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::mailer::config::MailerConfig;
use crate::mailer::error::MailerError;
use crate::mailer::report::{DeliveryOutcome, DeliveryReport};
use crate::mailer::smtp::SmtpConnector;
use crate::mailer::transport::{Connector, DispatchTask, Gateway, OutgoingMessage};
use crate::recipients::{AddressSet, EmailAddress, validate_exact};

const ABORTED_TASK_DETAIL: &str = "send task aborted before completion";

/// Fans a single message out to many recipients.
///
/// Holds only read-only configuration; every call configures its own
/// connection, so concurrent calls share nothing.
#[derive(Clone)]
pub struct BulkDispatcher {
    config: MailerConfig,
    connector: Arc<dyn Connector>,
}

impl BulkDispatcher {
    pub fn new(config: MailerConfig, connector: Arc<dyn Connector>) -> Self {
        Self { config, connector }
    }

    /// Dispatcher using the SMTP relay described by `config`.
    pub fn smtp(config: MailerConfig) -> Self {
        Self::new(config, Arc::new(SmtpConnector))
    }

    pub fn config(&self) -> &MailerConfig {
        &self.config
    }

    /// Send `subject`/`body` to every candidate address.
    ///
    /// Returns an error only when the call is rejected before the first send:
    /// missing subject or body, no recipients, any malformed address, missing
    /// credentials, or an unreachable server. Once sending starts, recipient
    /// failures are reported inside the [`DeliveryReport`].
    pub async fn dispatch<S: AsRef<str>>(
        &self,
        candidates: &[S],
        subject: &str,
        body: &str,
    ) -> Result<DeliveryReport, MailerError> {
        if subject.trim().is_empty() || body.trim().is_empty() {
            return Err(MailerError::MissingFields);
        }

        let validation = validate_exact(candidates);
        if !validation.is_clean() {
            log::debug!(
                "rejecting dispatch with {} invalid address(es)",
                validation.rejected.len()
            );
            return Err(MailerError::InvalidAddresses(validation.rejected));
        }
        if validation.accepted.is_empty() {
            return Err(MailerError::NoRecipients);
        }
        let recipients = validation.accepted;

        let gateway = self.connector.configure(&self.config)?;

        let dispatch_id = Uuid::new_v4();
        if let Err(err) = gateway.verify_reachable().await {
            log::error!("dispatch {}: SMTP verification failed: {}", dispatch_id, err);
            return Err(MailerError::unavailable(err));
        }

        log::info!(
            "dispatch {}: sending to {} recipient(s)",
            dispatch_id,
            recipients.len()
        );

        let message = Arc::new(OutgoingMessage::compose(subject, body));
        let outcomes = fan_out(dispatch_id, gateway, recipients, message).await;
        let report = DeliveryReport::from_outcomes(outcomes);

        if report.is_partial() {
            log::warn!(
                "dispatch {}: partial delivery, {} sent, {} failed",
                dispatch_id,
                report.success_count(),
                report.failure_count()
            );
        } else {
            log::info!(
                "dispatch {}: {} sent, {} failed",
                dispatch_id,
                report.success_count(),
                report.failure_count()
            );
        }

        Ok(report)
    }
}

/// Spawn one task per recipient, wait for all of them, and return outcomes in
/// recipient order regardless of completion order.
async fn fan_out(
    dispatch_id: Uuid,
    gateway: Arc<dyn Gateway>,
    recipients: AddressSet,
    message: Arc<OutgoingMessage>,
) -> Vec<DeliveryOutcome> {
    let recipients: Vec<EmailAddress> = recipients.into_vec();
    let mut slots: Vec<Option<DeliveryOutcome>> = vec![None; recipients.len()];
    let mut tasks = JoinSet::new();

    for (position, recipient) in recipients.iter().cloned().enumerate() {
        let gateway = Arc::clone(&gateway);
        let task = DispatchTask {
            position,
            recipient,
            message: Arc::clone(&message),
        };

        tasks.spawn(async move {
            let outcome = match gateway.send_one(&task).await {
                Ok(()) => DeliveryOutcome::sent(task.recipient),
                Err(err) => {
                    log::warn!(
                        "dispatch {}: failed to send to {}: {}",
                        dispatch_id,
                        task.recipient,
                        err
                    );
                    DeliveryOutcome::failed(task.recipient, err.to_string())
                }
            };
            (task.position, outcome)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((position, outcome)) => slots[position] = Some(outcome),
            Err(err) => log::error!("dispatch {}: send task failed: {}", dispatch_id, err),
        }
    }

    slots
        .into_iter()
        .zip(recipients)
        .map(|(slot, recipient)| {
            slot.unwrap_or_else(|| DeliveryOutcome::failed(recipient, ABORTED_TASK_DETAIL))
        })
        .collect()
}
